//! [`TestWorkspace`] builder for discovery and gateway scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temporary parent directory holding any number of fake repositories.
///
/// # Example
///
/// ```rust,no_run
/// use repo_test_utils::TestWorkspace;
///
/// let ws = TestWorkspace::new();
/// ws.node_repo("api", &["express"]);
/// ws.foundry_repo("token");
/// ws.file("api/src/routes/users.ts", "router.get('/users')");
/// ```
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorkspace {
    /// Create an empty temporary parent directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// Root of the workspace.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of `rel` inside the workspace.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    /// Create an empty directory (no repository indicators).
    pub fn dir(&self, rel: &str) -> PathBuf {
        let path = self.path(rel);
        fs::create_dir_all(&path).unwrap();
        path
    }

    /// Write `content` to `rel`, creating parent directories.
    pub fn file(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    /// A repository with a `package.json` listing `deps` as dependencies.
    pub fn node_repo(&self, name: &str, deps: &[&str]) -> PathBuf {
        let deps = deps
            .iter()
            .map(|d| format!("\"{d}\": \"^1.0.0\""))
            .collect::<Vec<_>>()
            .join(", ");
        let manifest = format!("{{\"name\": \"{name}\", \"dependencies\": {{{deps}}}}}");
        self.file(&format!("{name}/package.json"), &manifest);
        self.path(name)
    }

    /// A Foundry smart-contract repository.
    pub fn foundry_repo(&self, name: &str) -> PathBuf {
        self.file(
            &format!("{name}/foundry.toml"),
            "[profile.default]\nsrc = \"src\"\n",
        );
        self.path(name)
    }

    /// A repository whose only indicator is a fake `.git` directory.
    pub fn git_repo(&self, name: &str) -> PathBuf {
        let path = self.dir(name);
        crate::git::fake_git_dir(&path);
        path
    }

    /// Write a TOML tool manifest at `rel` (a file path ending in `.toml`).
    pub fn tool_manifest(&self, rel: &str, tools: &[(&str, &str, &[&str])]) -> PathBuf {
        let mut content = String::new();
        for (name, command, args) in tools {
            let args = args
                .iter()
                .map(|a| format!("\"{a}\""))
                .collect::<Vec<_>>()
                .join(", ");
            content.push_str(&format!(
                "[[tools]]\nname = \"{name}\"\ndescription = \"{name} tool\"\ncommand = \"{command}\"\nargs = [{args}]\n\n"
            ));
        }
        self.file(rel, &content)
    }
}
