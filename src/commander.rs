use std::{
    env::{join_paths, split_paths, var_os},
    ffi::OsString,
    fs, iter,
    path::{Path, PathBuf},
};

use anyhow::{Result, anyhow};

use crate::{
    project::{BOOTLOADER_FW_TYPE, Project},
    shell::Shell,
    step::Step,
};

/// Writes the resolved metadata next to the firmware binary and runs
/// `commander gbl create` on it.
pub struct PackageGbl {
    extra_path: Option<PathBuf>,
}

impl PackageGbl {
    pub fn new_boxed(extra_path: Option<PathBuf>) -> Box<dyn Step> {
        Box::new(Self { extra_path })
    }
}

/// The token sequence for commander, minus the program itself. Absent
/// optional settings contribute no tokens.
fn commander_args(project: &Project, metadata_path: &Path, gbl_path: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["gbl".into(), "create".into(), gbl_path.into()];

    args.push(if project.gbl.fw_type == BOOTLOADER_FW_TYPE {
        "--bootloader".into()
    } else {
        "--app".into()
    });
    args.push(project.out_file.as_os_str().into());
    args.push("--device".into());
    args.push(project.device_part_id.as_str().into());
    args.push("--metadata".into());
    args.push(metadata_path.into());

    if let Some(codec) = &project.gbl.compression {
        args.push("--compress".into());
        args.push(codec.into());
    }

    if let Some(key) = &project.gbl.sign_key {
        args.push("--sign".into());
        args.push(key.into());
    }

    if let Some(key) = &project.gbl.encrypt_key {
        args.push("--encrypt".into());
        args.push(key.into());
    }

    args
}

impl Step for PackageGbl {
    fn run(&mut self, project: &mut Project) -> Result<()> {
        let metadata = project
            .metadata
            .as_ref()
            .ok_or_else(|| anyhow!("metadata has not been resolved"))?;

        // commander reads the metadata from disk, not from the command line
        let metadata_path = project.artifact_root.join("gbl_metadata.json");
        fs::write(&metadata_path, serde_json::to_string(metadata)?)
            .map_err(|e| anyhow!("can not write {}: {e}", metadata_path.display()))?;

        let gbl_path = project.out_file.with_extension("gbl");

        let mut cmd = project.shell("commander");
        cmd.args(commander_args(project, &metadata_path, &gbl_path));

        // The extra search directory goes on the child's PATH only, the
        // parent environment is left alone.
        if let Some(extra) = &self.extra_path {
            let path = var_os("PATH").unwrap_or_default();
            let joined = join_paths(split_paths(&path).chain(iter::once(extra.clone())))
                .map_err(|e| anyhow!("invalid search path {}: {e}", extra.display()))?;
            cmd.env("PATH", joined);
        }

        cmd.exec(project.is_print_cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::GblConfig;

    fn test_project(fw_type: &str) -> Project {
        Project {
            out_file: PathBuf::from("/build/app.out"),
            artifact_root: PathBuf::from("/build"),
            name: "app".to_string(),
            project_root: PathBuf::from("/project"),
            sdk_path: PathBuf::from("/opt/gecko_sdk"),
            sdk_version: "4.4.3".to_string(),
            device_part_id: "EFR32MG21A020F768IM32".to_string(),
            gbl: GblConfig {
                fw_type: fw_type.to_string(),
                baudrate: 115200,
                dynamic: Vec::new(),
                compression: None,
                sign_key: None,
                encrypt_key: None,
            },
            metadata: None,
            is_print_cmd: false,
        }
    }

    fn args_of(project: &Project) -> Vec<String> {
        commander_args(
            project,
            Path::new("/build/gbl_metadata.json"),
            Path::new("/build/app.gbl"),
        )
        .into_iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect()
    }

    #[test]
    fn app_firmware_uses_app_flag() {
        let args = args_of(&test_project("ncp-uart-hw"));

        assert_eq!(
            args,
            vec![
                "gbl",
                "create",
                "/build/app.gbl",
                "--app",
                "/build/app.out",
                "--device",
                "EFR32MG21A020F768IM32",
                "--metadata",
                "/build/gbl_metadata.json",
            ]
        );
    }

    #[test]
    fn bootloader_firmware_uses_bootloader_flag() {
        let args = args_of(&test_project("gecko-bootloader"));

        assert!(args.contains(&"--bootloader".to_string()));
        assert!(!args.contains(&"--app".to_string()));
    }

    #[test]
    fn present_settings_append_their_flags() {
        let mut project = test_project("ncp-uart-hw");
        project.gbl.compression = Some("lzma".to_string());
        project.gbl.sign_key = Some(PathBuf::from("/keys/sign.pem"));
        project.gbl.encrypt_key = Some(PathBuf::from("/keys/encrypt.key"));

        let args = args_of(&project);

        let tail: Vec<_> = args[args.len() - 6..].to_vec();
        assert_eq!(
            tail,
            vec![
                "--compress",
                "lzma",
                "--sign",
                "/keys/sign.pem",
                "--encrypt",
                "/keys/encrypt.key",
            ]
        );
    }

    #[test]
    fn absent_settings_contribute_no_tokens() {
        let args = args_of(&test_project("ncp-uart-hw"));

        assert!(!args.contains(&"--compress".to_string()));
        assert!(!args.contains(&"--sign".to_string()));
        assert!(!args.contains(&"--encrypt".to_string()));
    }
}
