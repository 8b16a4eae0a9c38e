//! Folder path scheme for the media store.
//!
//! Every location's images live under `<root>/<continent>/<location>`, with
//! both display names sanitized the same way at every call site. Upload,
//! list, and delete all build paths through [`FolderPath`], so they cannot
//! disagree about where a location's files are.

/// Reduce a display name to the characters the store accepts in folder names.
///
/// Whitespace runs become single hyphens; everything outside `[A-Za-z0-9-_]`
/// is dropped.
pub fn sanitize_segment(name: &str) -> String {
    let mut collapsed = String::with_capacity(name.len());
    let mut last_was_space = false;
    for ch in name.chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                collapsed.push('-');
            }
            last_was_space = true;
        } else {
            collapsed.push(ch);
            last_was_space = false;
        }
    }

    collapsed
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '-' || *ch == '_')
        .collect()
}

/// A folder in the media store's `<root>/<continent>/<location>` scheme.
///
/// Segments are sanitized on construction, so two paths built from the same
/// display names always compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FolderPath {
    path: String,
}

impl FolderPath {
    /// Build the folder path for a location's images.
    pub fn for_location(root: &str, continent_name: &str, location_name: &str) -> Self {
        let path = format!(
            "{}/{}/{}",
            root.trim_matches('/'),
            sanitize_segment(continent_name),
            sanitize_segment(location_name)
        );
        Self { path }
    }

    /// The path without a leading slash.
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// The path with a leading slash, as the store's API expects it.
    pub fn slash_prefixed(&self) -> String {
        format!("/{}", self.path)
    }
}

impl std::fmt::Display for FolderPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_whitespace_with_hyphens() {
        assert_eq!(sanitize_segment("Masai Mara"), "Masai-Mara");
        assert_eq!(sanitize_segment("Masai   Mara"), "Masai-Mara");
        assert_eq!(sanitize_segment("Bandipur\tNational Park"), "Bandipur-National-Park");
    }

    #[test]
    fn test_sanitize_strips_special_characters() {
        assert_eq!(sanitize_segment("Kruger!"), "Kruger");
        assert_eq!(sanitize_segment("Lake Nakuru (Kenya)"), "Lake-Nakuru-Kenya");
        assert_eq!(sanitize_segment("already-safe_name"), "already-safe_name");
    }

    #[test]
    fn test_sanitize_empty_and_symbol_only_names() {
        assert_eq!(sanitize_segment(""), "");
        assert_eq!(sanitize_segment("!!!"), "");
    }

    #[test]
    fn test_folder_path_for_location() {
        let folder = FolderPath::for_location("safari-gallery", "Africa", "Masai Mara");
        assert_eq!(folder.as_str(), "safari-gallery/Africa/Masai-Mara");
        assert_eq!(folder.slash_prefixed(), "/safari-gallery/Africa/Masai-Mara");
    }

    #[test]
    fn test_same_names_build_equal_paths() {
        let a = FolderPath::for_location("safari-gallery", "Africa", "Masai Mara");
        let b = FolderPath::for_location("safari-gallery", "Africa", "Masai Mara");
        assert_eq!(a, b);
    }
}
