//! Artifact discovery: find analyzable translation units on disk.
//!
//! The RTL dump extension is versioned by the compiler (`.c.270r.dfinish`,
//! where the pass number changes between GCC releases), so it is detected
//! from the first dump found rather than configured. A unit is analyzable
//! only when all three artifacts are present: RTL dump, stack-usage report,
//! and object file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::IngestError;

/// Fixed tail of every RTL dump file name.
const RTL_EXT_END: &str = ".dfinish";

/// Knobs controlling where and how artifacts are located.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Directory scanned recursively for artifacts.
    pub work_dir: PathBuf,
    /// Stack-usage report extension.
    pub su_ext: String,
    /// Object file extension.
    pub obj_ext: String,
    /// Manual-override file extension.
    pub manual_ext: String,
    /// When true, object and stack-usage files keep the source extension in
    /// their stem (`main.c.su` rather than `main.su`).
    pub dot_c_included: bool,
}

impl DiscoveryOptions {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            su_ext: ".su".to_string(),
            obj_ext: ".o".to_string(),
            manual_ext: ".msu".to_string(),
            dot_c_included: false,
        }
    }
}

/// One translation unit's artifact set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationUnit {
    /// Unit identity used throughout the store: the source file path
    /// relative to the work directory (e.g. `src/main.c`).
    pub name: String,
    pub rtl_path: PathBuf,
    pub su_path: PathBuf,
    pub object_path: PathBuf,
}

/// Result of scanning a work directory.
#[derive(Debug, Clone)]
pub struct DiscoveredArtifacts {
    /// Detected RTL extension including the pass number (e.g. `.270r.dfinish`).
    pub rtl_ext: String,
    pub units: Vec<TranslationUnit>,
    pub manual_files: Vec<PathBuf>,
}

/// Scan the work directory for analyzable units and manual-override files.
pub fn discover_artifacts(options: &DiscoveryOptions) -> Result<DiscoveredArtifacts, IngestError> {
    let mut files: Vec<PathBuf> = WalkDir::new(&options.work_dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();
    files.sort();

    let rtl_ext = detect_rtl_ext(&files).ok_or_else(|| IngestError::NoRtlDumps {
        dir: options.work_dir.clone(),
        rtl_ext_end: RTL_EXT_END.to_string(),
    })?;
    log::debug!("detected RTL extension {rtl_ext}");

    let file_set: HashSet<&Path> = files.iter().map(|p| p.as_path()).collect();
    let mut units = Vec::new();

    for file in &files {
        let Some(base) = strip_path_suffix(file, &rtl_ext) else { continue };
        let stem = if options.dot_c_included {
            base.clone()
        } else {
            match base.rfind('.') {
                Some(index) => base[..index].to_string(),
                None => base.clone(),
            }
        };
        let su_path = PathBuf::from(format!("{stem}{}", options.su_ext));
        let object_path = PathBuf::from(format!("{stem}{}", options.obj_ext));
        if !file_set.contains(su_path.as_path()) || !file_set.contains(object_path.as_path()) {
            log::debug!("skipping {base}: missing {} or {}", options.su_ext, options.obj_ext);
            continue;
        }

        let name = Path::new(&base)
            .strip_prefix(&options.work_dir)
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|_| base.clone());
        units.push(TranslationUnit { name, rtl_path: file.clone(), su_path, object_path });
    }

    if units.is_empty() {
        return Err(IngestError::NoTranslationUnits { dir: options.work_dir.clone() });
    }

    let manual_files: Vec<PathBuf> = files
        .iter()
        .filter(|file| {
            file.to_string_lossy().ends_with(&options.manual_ext)
        })
        .cloned()
        .collect();

    Ok(DiscoveredArtifacts { rtl_ext, units, manual_files })
}

/// Derive the versioned RTL extension from the first dump file found.
///
/// `main.c.270r.dfinish` yields `.270r.dfinish`.
fn detect_rtl_ext(files: &[PathBuf]) -> Option<String> {
    for file in files {
        let Some(os_name) = file.file_name() else { continue };
        let name = os_name.to_string_lossy();
        if let Some(head) = name.strip_suffix(RTL_EXT_END) {
            return match head.rfind('.') {
                Some(index) => Some(format!("{}{}", &head[index..], RTL_EXT_END)),
                None => Some(RTL_EXT_END.to_string()),
            };
        }
    }
    None
}

/// Strip `suffix` from the path's string form, returning the remainder.
fn strip_path_suffix(path: &Path, suffix: &str) -> Option<String> {
    let text = path.to_string_lossy();
    text.strip_suffix(suffix).map(|s| s.to_string())
}
