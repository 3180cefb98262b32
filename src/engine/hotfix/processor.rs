//! Per-content-type hotfix handlers.
//!
//! `HotfixProcessor` has a default implementation for every content type;
//! hosts override single methods instead of replacing the synchronizer.

use std::path::PathBuf;
use tracing::{debug, info};

use super::client::ContentManifestClient;
use super::manifest::{ContentKind, FilterRules, ManifestEntry};
use super::targets::{HotfixTargets, ReloadRequirement};
use crate::engine::error::UpdateError;

/// What applying one file did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// Archive that is now mounted and must be unmounted before the next
    /// differing cycle.
    pub mounted: Option<PathBuf>,
    pub requirement: ReloadRequirement,
}

/// Borrowed view of everything a handler may touch.
pub struct ApplyContext<'a> {
    pub rules: &'a FilterRules,
    pub targets: &'a HotfixTargets,
    pub client: &'a dyn ContentManifestClient,
}

impl ApplyContext<'_> {
    pub fn cache_path(&self, entry: &ManifestEntry) -> PathBuf {
        self.client.cache_path(entry)
    }
}

pub trait HotfixProcessor: Send + Sync {
    /// Whether an enumerated file takes part in the cycle at all.
    fn wants_processing(&self, rules: &FilterRules, entry: &ManifestEntry) -> bool {
        rules.classify(&entry.display_name).is_some()
    }

    /// Apply one downloaded file, dispatching on its content type.
    fn apply(&self, ctx: &ApplyContext<'_>, entry: &ManifestEntry) -> Result<ApplyOutcome, UpdateError> {
        match ctx.rules.classify(&entry.display_name) {
            Some(ContentKind::Config) => self.hotfix_config_file(ctx, entry),
            Some(ContentKind::Localization) => self.hotfix_localization_file(ctx, entry),
            Some(ContentKind::Archive) => self.hotfix_archive_file(ctx, entry),
            // Accepted by an overridden wants_processing but unknown here.
            None => Ok(ApplyOutcome::default()),
        }
    }

    fn hotfix_config_file(&self, ctx: &ApplyContext<'_>, entry: &ManifestEntry) -> Result<ApplyOutcome, UpdateError> {
        let bytes = ctx
            .client
            .file_contents(&entry.download_id)
            .ok_or_else(|| apply_failure(entry, "no downloaded contents"))?;
        let delta = decode_text(&bytes);
        let store_name = ctx.rules.config_store_name(&entry.display_name);

        ctx.targets
            .config
            .merge(&store_name, &delta)
            .map_err(|e| apply_failure(entry, e))?;

        let scan = scan_section_headers(&delta);
        if !scan.is_empty() {
            let reloaded = ctx
                .targets
                .config
                .reload_instances_of_types(&scan.class_names, &scan.object_names);
            debug!(
                "{} touched {} classes and {} objects, reloaded {} instances",
                entry.display_name,
                scan.class_names.len(),
                scan.object_names.len(),
                reloaded
            );
        }
        info!("merged config delta {} into store {}", entry.display_name, store_name);
        Ok(ApplyOutcome::default())
    }

    fn hotfix_localization_file(
        &self,
        ctx: &ApplyContext<'_>,
        entry: &ManifestEntry,
    ) -> Result<ApplyOutcome, UpdateError> {
        let path = ctx.cache_path(entry);
        ctx.targets
            .localization
            .update_from(&path)
            .map_err(|e| apply_failure(entry, e))?;
        info!("localization resource swapped to {}", path.display());
        Ok(ApplyOutcome::default())
    }

    fn hotfix_archive_file(&self, ctx: &ApplyContext<'_>, entry: &ManifestEntry) -> Result<ApplyOutcome, UpdateError> {
        let path = ctx.cache_path(entry);
        if !ctx.targets.archives.mount(&path) {
            return Err(apply_failure(entry, format!("could not mount {}", path.display())));
        }
        let requirement = ctx.targets.archives.reload_requirement(&path);
        info!("mounted archive {} ({:?})", path.display(), requirement);
        Ok(ApplyOutcome {
            mounted: Some(path),
            requirement,
        })
    }
}

/// Stock handlers for every content type.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultHotfixProcessor;

impl HotfixProcessor for DefaultHotfixProcessor {}

fn apply_failure(entry: &ManifestEntry, reason: impl ToString) -> UpdateError {
    UpdateError::ApplyFailure {
        file: entry.display_name.clone(),
        reason: reason.to_string(),
    }
}

fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Classes and per-object-config names a config delta touches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionScan {
    pub class_names: Vec<String>,
    pub object_names: Vec<String>,
}

impl SectionScan {
    pub fn is_empty(&self) -> bool {
        self.class_names.is_empty() && self.object_names.is_empty()
    }
}

/// Collect section headers from ini text.
///
/// `[ClassName]` and `[/Script/Module.ClassName]` name a class;
/// `[ObjectName ClassName]` names a per-object-config instance.
pub fn scan_section_headers(ini: &str) -> SectionScan {
    let mut scan = SectionScan::default();

    for line in ini.lines() {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('[') else {
            continue;
        };
        let Some(end) = rest.find(']') else {
            continue;
        };
        let header = rest[..end].trim();
        if header.is_empty() {
            continue;
        }

        if let Some((object_name, _class)) = header.split_once(' ') {
            push_unique(&mut scan.object_names, object_name);
        } else {
            let class_name = header.rsplit('/').next().unwrap_or(header);
            let class_name = class_name.rsplit('.').next().unwrap_or(class_name);
            if !class_name.is_empty() {
                push_unique(&mut scan.class_names, class_name);
            }
        }
    }

    scan
}

fn push_unique(names: &mut Vec<String>, name: &str) {
    if !names.iter().any(|n| n == name) {
        names.push(name.to_string());
    }
}
