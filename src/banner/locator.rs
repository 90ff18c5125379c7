//! Template and font file lookup.

use std::path::{Path, PathBuf};

const TEMPLATE_EXTENSIONS: [&str; 3] = [".svg.mustache", ".mustache", ".svg"];
const FONT_EXTENSIONS: [&str; 4] = [".ttf", ".otf", ".woff", ".woff2"];

/// Searches a list of directories for resource files.
///
/// The default search path is the working directory, `templates` and
/// `fonts`, plus `<prefix>/templates` and `<prefix>/fonts` when the running
/// executable lives in `<prefix>/bin`.
#[derive(Debug, Clone)]
pub struct ResourceLocator {
    search_paths: Vec<PathBuf>,
}

impl Default for ResourceLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceLocator {
    pub fn new() -> Self {
        let mut search_paths = vec![
            PathBuf::from("."),
            PathBuf::from("templates"),
            PathBuf::from("fonts"),
        ];

        if let Ok(exe) = std::env::current_exe()
            && let Some(exe_dir) = exe.parent()
            && exe_dir.file_name().is_some_and(|name| name == "bin")
            && let Some(prefix) = exe_dir.parent()
        {
            search_paths.push(prefix.join("templates"));
            search_paths.push(prefix.join("fonts"));
        }

        Self { search_paths }
    }

    /// Locator over an explicit list of directories.
    pub fn with_search_paths(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    /// Search `dir` before the existing paths.
    pub fn prepend(&mut self, dir: impl Into<PathBuf>) {
        self.search_paths.insert(0, dir.into());
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// First existing `<search path>/<name>`. An absolute path that exists
    /// is returned as-is.
    pub fn find_file(&self, name: impl AsRef<Path>) -> Option<PathBuf> {
        let name = name.as_ref();
        if name.is_absolute() && name.exists() {
            return Some(name.to_path_buf());
        }

        self.search_paths
            .iter()
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.exists())
    }

    /// Find a template, trying `.svg.mustache`, `.mustache` and `.svg` when
    /// `name` has no extension.
    pub fn find_template(&self, name: &str) -> Option<PathBuf> {
        self.find_with_extensions(name, &TEMPLATE_EXTENSIONS)
    }

    /// Find a font file, trying `.ttf`, `.otf`, `.woff` and `.woff2` when
    /// `name` has no extension.
    pub fn find_font(&self, name: &str) -> Option<PathBuf> {
        self.find_with_extensions(name, &FONT_EXTENSIONS)
    }

    fn find_with_extensions(&self, name: &str, extensions: &[&str]) -> Option<PathBuf> {
        if Path::new(name).extension().is_none()
            && let Some(found) = extensions
                .iter()
                .find_map(|ext| self.find_file(format!("{name}{ext}")))
        {
            return Some(found);
        }
        self.find_file(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn locator(dirs: &[&Path]) -> ResourceLocator {
        ResourceLocator::with_search_paths(dirs.iter().map(|d| d.to_path_buf()).collect())
    }

    #[test]
    fn test_find_file_in_order() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        std::fs::write(b.path().join("x.svg"), "b").unwrap();
        let loc = locator(&[a.path(), b.path()]);
        assert_eq!(loc.find_file("x.svg"), Some(b.path().join("x.svg")));

        std::fs::write(a.path().join("x.svg"), "a").unwrap();
        assert_eq!(loc.find_file("x.svg"), Some(a.path().join("x.svg")));
    }

    #[test]
    fn test_find_template_extensions() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("banner.svg"), "").unwrap();
        let loc = locator(&[dir.path()]);
        assert_eq!(loc.find_template("banner"), Some(dir.path().join("banner.svg")));

        std::fs::write(dir.path().join("banner.svg.mustache"), "").unwrap();
        assert_eq!(
            loc.find_template("banner"),
            Some(dir.path().join("banner.svg.mustache"))
        );
    }

    #[test]
    fn test_find_font() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("inter.woff2"), "").unwrap();
        let loc = locator(&[dir.path()]);
        assert_eq!(loc.find_font("inter"), Some(dir.path().join("inter.woff2")));
        assert_eq!(loc.find_font("inter.woff2"), Some(dir.path().join("inter.woff2")));
    }

    #[test]
    fn test_absolute_and_missing() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("abs.svg");
        std::fs::write(&file, "").unwrap();
        let loc = locator(&[]);
        assert_eq!(loc.find_file(&file), Some(file.clone()));
        assert_eq!(loc.find_template("missing"), None);
        assert_eq!(loc.find_file(dir.path().join("nope.svg")), None);
    }

    #[test]
    fn test_prepend() {
        let mut loc = ResourceLocator::new();
        loc.prepend("/srv/templates");
        assert_eq!(loc.search_paths()[0], PathBuf::from("/srv/templates"));
    }
}
