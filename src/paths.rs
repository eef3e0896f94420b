use std::path::{Path, PathBuf};

/// Locations derived from the running executable
#[derive(Debug, Clone, Default)]
pub struct Paths {
    /// The envprof executable, e.g. `<profile>/bin/envprof`
    pub exe: Option<PathBuf>,
    /// Directory holding the executable, e.g. `<profile>/bin`
    pub install_dir: Option<PathBuf>,
}

impl Paths {
    /// Locate the running executable. Failure is not an error: activation
    /// with an explicit directory does not need it.
    pub fn new() -> Self {
        match std::env::current_exe() {
            Ok(exe) => Self::from_exe(exe),
            Err(e) => {
                tracing::warn!(error = %e, "failed to determine executable location");
                Self::default()
            }
        }
    }

    pub fn from_exe(exe: PathBuf) -> Self {
        let install_dir = exe.parent().map(Path::to_path_buf);
        Self {
            exe: Some(exe),
            install_dir,
        }
    }

    /// Command the generated `deactivate` function runs; falls back to a
    /// `PATH` lookup
    pub fn exe_command(&self) -> String {
        self.exe
            .as_ref()
            .map(|exe| exe.to_string_lossy().into_owned())
            .unwrap_or_else(|| "envprof".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_from_exe() {
        let paths = Paths::from_exe(PathBuf::from("/opt/env/bin/envprof"));
        assert_eq!(paths.install_dir, Some(PathBuf::from("/opt/env/bin")));
        assert_eq!(paths.exe_command(), "/opt/env/bin/envprof");
    }

    #[test]
    fn test_paths_default_command() {
        assert_eq!(Paths::default().exe_command(), "envprof");
    }
}
