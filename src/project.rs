use std::{
    env::current_dir,
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::{Result, anyhow};
use colored::Colorize;
use serde::Deserialize;

use crate::{locate::find_in_parent_dirs, metadata::MetadataRecord, parse::parse_simple_config};

/// Firmware type that selects commander's bootloader mode.
pub const BOOTLOADER_FW_TYPE: &str = "gecko-bootloader";

/// Declarative packaging config, read from `gbl_metadata.yaml` next to the
/// project file.
#[derive(Debug, Clone, Deserialize)]
pub struct GblConfig {
    pub fw_type: String,
    pub baudrate: u32,
    #[serde(default)]
    pub dynamic: Vec<String>,
    #[serde(default)]
    pub compression: Option<String>,
    #[serde(default)]
    pub sign_key: Option<PathBuf>,
    #[serde(default)]
    pub encrypt_key: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct SlcpProject {
    sdk: SdkInfo,
}

#[derive(Debug, Deserialize)]
struct SdkInfo {
    version: String,
}

#[derive(Debug)]
pub struct Project {
    pub out_file: PathBuf,
    pub artifact_root: PathBuf,
    pub name: String,
    pub project_root: PathBuf,
    pub sdk_path: PathBuf,
    pub sdk_version: String,
    pub device_part_id: String,
    pub gbl: GblConfig,
    pub metadata: Option<MetadataRecord>,
    pub is_print_cmd: bool,
}

impl Project {
    /// Discovery for the Simplicity Studio post-build step. Studio passes the
    /// project file and a `build_dir:`-prefixed build directory; the SDK path
    /// comes from the generated cmake file in that directory.
    pub fn from_postbuild(project_file: &Path, build_dir: &str) -> Result<Self> {
        let build_dir = PathBuf::from(build_dir.strip_prefix("build_dir:").unwrap_or(build_dir));
        let name = file_stem(project_file)?;
        let out_file = build_dir.join(format!("{name}.out"));
        let sdk_path = sdk_path_from_cmake(&build_dir.join(format!("{name}.cmake")))?;

        Self::discover(out_file, Some(sdk_path))
    }

    /// Discovery for a manual run against an already-built binary. The SDK
    /// path is read from the generated Makefile instead.
    pub fn from_out_file(out_file: &Path) -> Result<Self> {
        let out_file = if out_file.is_absolute() {
            out_file.to_path_buf()
        } else {
            current_dir()?.join(out_file)
        };

        Self::discover(out_file, None)
    }

    fn discover(out_file: PathBuf, sdk_path: Option<PathBuf>) -> Result<Self> {
        let artifact_root = out_file
            .parent()
            .ok_or_else(|| anyhow!("no parent directory for {}", out_file.display()))?
            .to_path_buf();
        let name = file_stem(&out_file)?;

        let slcp_path = find_in_parent_dirs(&artifact_root, &format!("{name}.slcp"))?;
        let project_root = slcp_path
            .parent()
            .ok_or_else(|| anyhow!("no parent directory for {}", slcp_path.display()))?
            .to_path_buf();

        let sdk_path = match sdk_path {
            Some(path) => path,
            None => {
                let mak_path = find_in_parent_dirs(&artifact_root, &format!("{name}.project.mak"))?;
                let mak = parse_simple_config(&read_text(&mak_path)?);
                PathBuf::from(mak.get("BASE_SDK_PATH").ok_or_else(|| {
                    anyhow!("no BASE_SDK_PATH in {}", mak_path.display())
                })?)
            }
        };

        let slcp: SlcpProject = serde_yaml::from_str(&read_text(&slcp_path)?)
            .map_err(|e| anyhow!("invalid project file {}: {e}", slcp_path.display()))?;

        let slps_path = project_root.join(format!("{name}.slps"));
        let device_part_id = device_part_id(&slps_path)?;
        println!("Detected device part ID: {}", device_part_id.cyan().bold());

        let gbl_path = project_root.join("gbl_metadata.yaml");
        let gbl: GblConfig = serde_yaml::from_str(&read_text(&gbl_path)?)
            .map_err(|e| anyhow!("invalid {}: {e}", gbl_path.display()))?;

        Ok(Self {
            out_file,
            artifact_root,
            name,
            project_root,
            sdk_path,
            sdk_version: slcp.sdk.version,
            device_part_id,
            gbl,
            metadata: None,
            is_print_cmd: true,
        })
    }

    pub fn shell<S: AsRef<OsStr>>(&self, program: S) -> Command {
        let mut cmd = Command::new(program);
        cmd.current_dir(&self.artifact_root);
        cmd
    }
}

/// Extracts the part number from the project descriptor: the value of the
/// `projectCommon.partId` property, last dot-separated segment, uppercased.
fn device_part_id(slps_path: &Path) -> Result<String> {
    let text = read_text(slps_path)?;
    let doc = roxmltree::Document::parse(&text)
        .map_err(|e| anyhow!("invalid project descriptor {}: {e}", slps_path.display()))?;

    let part_id = doc
        .descendants()
        .find(|node| {
            node.has_tag_name("properties")
                && node.attribute("key") == Some("projectCommon.partId")
        })
        .and_then(|node| node.attribute("value"))
        .ok_or_else(|| {
            anyhow!("no projectCommon.partId property in {}", slps_path.display())
        })?;

    Ok(part_id
        .rsplit('.')
        .next()
        .unwrap_or(part_id)
        .to_uppercase())
}

/// Pulls the SDK path out of the generated `set(SDK_PATH "...")` line.
fn sdk_path_from_cmake(cmake_path: &Path) -> Result<PathBuf> {
    let text = read_text(cmake_path)?;

    let path = text
        .split_once("set(SDK_PATH \"")
        .and_then(|(_, rest)| rest.split_once('"'))
        .map(|(path, _)| path)
        .ok_or_else(|| anyhow!("no SDK_PATH in {}", cmake_path.display()))?;

    Ok(PathBuf::from(path))
}

fn file_stem(path: &Path) -> Result<String> {
    Ok(path
        .file_stem()
        .ok_or_else(|| anyhow!("no file name in {}", path.display()))?
        .to_string_lossy()
        .into_owned())
}

pub(crate) fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|_| anyhow!("can not read {}", path.display()))
}
