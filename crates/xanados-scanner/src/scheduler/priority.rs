//! Submission-time priority heuristics.

use std::path::{Component, Path, PathBuf};

use xanados_core::types::ScanPriority;

const CRITICAL_EXTENSIONS: &[&str] = &[
    "exe", "dll", "so", "elf", "bin", "msi", "com", "scr", "sys", "jar", "apk", "appimage", "deb",
    "rpm", "sh", "bash", "zsh", "ps1", "bat", "cmd", "vbs", "js", "py", "pl", "rb", "php",
];

const HIGH_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "docm", "xls", "xlsx", "xlsm", "ppt", "pptx", "pptm", "rtf", "odt",
    "ods", "odp",
];

const MEDIUM_EXTENSIONS: &[&str] = &[
    "zip", "rar", "7z", "tar", "gz", "tgz", "bz2", "xz", "zst", "cab", "iso",
];

const LOW_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "svg", "mp3", "wav", "flac", "ogg", "mp4", "mkv",
    "avi", "mov", "webm",
];

const SYSTEM_BIN_DIRS: &[&str] = &[
    "/bin",
    "/sbin",
    "/usr/bin",
    "/usr/sbin",
    "/usr/local/bin",
    "/usr/local/sbin",
    "/usr/libexec",
];

const TEMP_DIRS: &[&str] = &["/tmp", "/var/tmp", "/var/cache"];

const TEMP_COMPONENTS: &[&str] = &[".cache", "cache", "Cache", "tmp", "temp", "Temp"];

const DOWNLOAD_COMPONENTS: &[&str] = &["Downloads", "Desktop"];

/// Maps a path to its dispatch priority.
///
/// The extension table decides when it recognizes the extension. Otherwise
/// location rules apply: system binary directories are critical, the user's
/// home and download areas are high, temp and cache areas are low, and
/// anything else is background work.
#[derive(Debug, Clone, Default)]
pub struct PriorityClassifier {
    home: Option<PathBuf>,
}

impl PriorityClassifier {
    /// Classifier using `$HOME` for the home-directory rule.
    pub fn from_env() -> Self {
        Self {
            home: std::env::var_os("HOME")
                .filter(|h| !h.is_empty())
                .map(PathBuf::from),
        }
    }

    pub fn with_home(home: Option<PathBuf>) -> Self {
        Self { home }
    }

    pub fn classify(&self, path: &Path) -> ScanPriority {
        Self::by_extension(path).unwrap_or_else(|| self.by_location(path))
    }

    fn by_extension(path: &Path) -> Option<ScanPriority> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        let ext = ext.as_str();
        if CRITICAL_EXTENSIONS.contains(&ext) {
            Some(ScanPriority::Critical)
        } else if HIGH_EXTENSIONS.contains(&ext) {
            Some(ScanPriority::High)
        } else if MEDIUM_EXTENSIONS.contains(&ext) {
            Some(ScanPriority::Medium)
        } else if LOW_EXTENSIONS.contains(&ext) {
            Some(ScanPriority::Low)
        } else {
            None
        }
    }

    fn by_location(&self, path: &Path) -> ScanPriority {
        if SYSTEM_BIN_DIRS.iter().any(|dir| path.starts_with(dir)) {
            return ScanPriority::Critical;
        }
        if has_component(path, DOWNLOAD_COMPONENTS) {
            return ScanPriority::High;
        }
        if TEMP_DIRS.iter().any(|dir| path.starts_with(dir)) || has_component(path, TEMP_COMPONENTS)
        {
            return ScanPriority::Low;
        }
        if self.home.as_deref().is_some_and(|home| path.starts_with(home)) {
            return ScanPriority::High;
        }
        ScanPriority::Background
    }
}

fn has_component(path: &Path, names: &[&str]) -> bool {
    path.components().any(|c| match c {
        Component::Normal(name) => name.to_str().is_some_and(|n| names.contains(&n)),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> PriorityClassifier {
        PriorityClassifier::with_home(Some(PathBuf::from("/home/alice")))
    }

    #[test]
    fn extension_table() {
        let c = classifier();
        assert_eq!(c.classify(Path::new("/srv/setup.exe")), ScanPriority::Critical);
        assert_eq!(c.classify(Path::new("/srv/report.DOCX")), ScanPriority::High);
        assert_eq!(c.classify(Path::new("/srv/bundle.zip")), ScanPriority::Medium);
        assert_eq!(c.classify(Path::new("/srv/photo.jpg")), ScanPriority::Low);
    }

    #[test]
    fn extension_wins_over_location() {
        let c = classifier();
        assert_eq!(c.classify(Path::new("/tmp/dropper.sh")), ScanPriority::Critical);
        assert_eq!(c.classify(Path::new("/usr/bin/logo.png")), ScanPriority::Low);
    }

    #[test]
    fn location_rules_for_unknown_extensions() {
        let c = classifier();
        assert_eq!(c.classify(Path::new("/usr/bin/curl")), ScanPriority::Critical);
        assert_eq!(
            c.classify(Path::new("/home/alice/Downloads/blob.dat")),
            ScanPriority::High
        );
        assert_eq!(c.classify(Path::new("/home/alice/notes")), ScanPriority::High);
        assert_eq!(
            c.classify(Path::new("/home/alice/.cache/thumb.dat")),
            ScanPriority::Low
        );
        assert_eq!(c.classify(Path::new("/var/tmp/x")), ScanPriority::Low);
        assert_eq!(c.classify(Path::new("/srv/data/blob.dat")), ScanPriority::Background);
    }

    #[test]
    fn no_home_means_no_home_rule() {
        let c = PriorityClassifier::with_home(None);
        assert_eq!(c.classify(Path::new("/home/alice/notes")), ScanPriority::Background);
    }
}
