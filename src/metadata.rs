use std::{collections::HashMap, fs, io, path::Path};

use anyhow::{Result, anyhow};
use serde::Serialize;

use crate::{
    parse::{Literal, parse_c_defines, parse_properties},
    project::{Project, read_text},
    step::Step,
};

pub const METADATA_VERSION: u32 = 1;

/// The metadata record handed to commander. Optional fields are only
/// serialized when a dynamic extraction filled them in, so the JSON never
/// carries nulls.
#[derive(Debug, Clone, Serialize)]
pub struct MetadataRecord {
    pub metadata_version: u32,
    pub sdk_version: String,
    pub fw_type: String,
    pub baudrate: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ezsp_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpc_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zwave_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ot_rcp_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gecko_bootloader_version: Option<String>,
}

impl MetadataRecord {
    fn new(project: &Project) -> Self {
        Self {
            metadata_version: METADATA_VERSION,
            sdk_version: project.sdk_version.clone(),
            fw_type: project.gbl.fw_type.clone(),
            baudrate: project.gbl.baudrate,
            ezsp_version: None,
            cpc_version: None,
            zwave_version: None,
            ot_rcp_version: None,
            gecko_bootloader_version: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum DynamicField {
    Ezsp,
    Cpc,
    Zwave,
    OtRcp,
    GeckoBootloader,
}

impl DynamicField {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "ezsp_version" => Some(Self::Ezsp),
            "cpc_version" => Some(Self::Cpc),
            "zwave_version" => Some(Self::Zwave),
            "ot_rcp_version" => Some(Self::OtRcp),
            "gecko_bootloader_version" => Some(Self::GeckoBootloader),
            _ => None,
        }
    }

    fn extract(self, project: &Project, record: &mut MetadataRecord) -> Result<()> {
        match self {
            Self::Ezsp => {
                record.ezsp_version =
                    Some(esf_version(&project.sdk_path.join("protocol/zigbee/esf.properties"))?);
            }
            Self::Cpc => record.cpc_version = Some(cpc_version(project)?),
            Self::Zwave => {
                record.zwave_version =
                    Some(esf_version(&project.sdk_path.join("protocol/z-wave/esf.properties"))?);
            }
            Self::OtRcp => record.ot_rcp_version = Some(ot_rcp_version(project)?),
            Self::GeckoBootloader => {
                record.gecko_bootloader_version = Some(bootloader_version(project)?);
            }
        }

        Ok(())
    }
}

/// Builds the full record for a project. Any failed extraction aborts the
/// run; there is no partial-success mode.
pub fn resolve(project: &Project) -> Result<MetadataRecord> {
    let mut record = MetadataRecord::new(project);

    for name in &project.gbl.dynamic {
        // names this version does not know are not an error
        let Some(field) = DynamicField::from_name(name) else {
            continue;
        };

        field.extract(project, &mut record)?;
    }

    Ok(record)
}

fn esf_version(path: &Path) -> Result<String> {
    let props = parse_properties(&read_text(path)?);

    props
        .get("version")
        .and_then(|tokens| tokens.first())
        .cloned()
        .ok_or_else(|| anyhow!("no version entry in {}", path.display()))
}

fn require<'a>(
    defines: &'a HashMap<String, Literal>,
    key: &str,
    path: &Path,
) -> Result<&'a Literal> {
    defines
        .get(key)
        .ok_or_else(|| anyhow!("{key} not defined in {}", path.display()))
}

fn cpc_version(project: &Project) -> Result<String> {
    let path = project.sdk_path.join("platform/common/inc/sl_gsdk_version.h");
    let defines = parse_c_defines(&read_text(&path)?);

    let mut version = format!(
        "{}.{}.{}",
        require(&defines, "SL_GSDK_MAJOR_VERSION", &path)?,
        require(&defines, "SL_GSDK_MINOR_VERSION", &path)?,
        require(&defines, "SL_GSDK_PATCH_VERSION", &path)?,
    );

    // The suffix header is optional; only its absence is tolerated.
    let suffix_path = project.project_root.join("config/internal_app_config.h");
    let app_config = match fs::read_to_string(&suffix_path) {
        Ok(text) => parse_c_defines(&text),
        Err(e) if e.kind() == io::ErrorKind::NotFound => HashMap::new(),
        Err(e) => return Err(anyhow!("can not read {}: {e}", suffix_path.display())),
    };

    if let Some(suffix) = app_config.get("CPC_SECONDARY_APP_VERSION_SUFFIX") {
        version += &suffix.to_string();
    }

    Ok(version)
}

fn ot_rcp_version(project: &Project) -> Result<String> {
    let path = project
        .project_root
        .join("config/sl_openthread_generic_config.h");
    let defines = parse_c_defines(&read_text(&path)?);

    Ok(require(&defines, "PACKAGE_STRING", &path)?.to_string())
}

fn bootloader_version(project: &Project) -> Result<String> {
    let path = project.sdk_path.join("platform/bootloader/config/btl_config.h");
    let defines = parse_c_defines(&read_text(&path)?);

    Ok(format!(
        "{}.{}.{}",
        require(&defines, "BOOTLOADER_VERSION_MAIN_MAJOR", &path)?,
        require(&defines, "BOOTLOADER_VERSION_MAIN_MINOR", &path)?,
        require(&defines, "BOOTLOADER_VERSION_MAIN_CUSTOMER", &path)?,
    ))
}

pub struct ResolveMetadata {}

impl ResolveMetadata {
    pub fn new_boxed() -> Box<dyn Step> {
        Box::new(Self {})
    }
}

impl Step for ResolveMetadata {
    fn run(&mut self, project: &mut Project) -> Result<()> {
        let record = resolve(project)?;

        println!("Generated GBL metadata: {}", serde_json::to_string(&record)?);

        project.metadata = Some(record);
        Ok(())
    }
}
