use std::env::{split_paths, var_os};
use std::path::PathBuf;

#[cfg(target_os = "macos")]
const COMMANDER_APP_DIR: &str = "/Applications/Simplicity Studio.app/Contents/Eclipse/developer/adapter_packs/commander/Commander.app/Contents/MacOS";

/// Extra directory to put on the packaging command's search path when
/// `commander` is not already resolvable. Only the macOS Studio bundle
/// needs this; everywhere else the tool is expected to be on PATH.
pub fn commander_search_path() -> Option<PathBuf> {
    if resolvable("commander") {
        return None;
    }

    #[cfg(target_os = "macos")]
    {
        let dir = PathBuf::from(COMMANDER_APP_DIR);
        if dir.join("commander").is_file() {
            return Some(dir);
        }
    }

    None
}

fn resolvable(program: &str) -> bool {
    let Some(path) = var_os("PATH") else {
        return false;
    };

    split_paths(&path).any(|dir| dir.join(program).is_file())
}
