use serde::Serialize;
use strum::{AsRefStr, Display};

use super::relay::encode_component;

const SHEETS_BASE: &str = "https://docs.google.com/spreadsheets/d";

/// The URL shapes a public sheet can be exported through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum VariantKind {
    ExportGid,
    ExportSheet,
    GvizSheet,
    GvizGid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetVariant {
    pub kind: VariantKind,
    pub url: String,
}

/// Export URLs for a sheet, in the order they are tried.
pub fn sheet_variants(sheet_id: &str, sheet_name: &str) -> Vec<SheetVariant> {
    let id = sheet_id.trim();
    let name = encode_component(sheet_name);
    vec![
        SheetVariant {
            kind: VariantKind::ExportGid,
            url: format!("{SHEETS_BASE}/{id}/export?format=csv&gid=0"),
        },
        SheetVariant {
            kind: VariantKind::ExportSheet,
            url: format!("{SHEETS_BASE}/{id}/export?format=csv&sheet={name}"),
        },
        SheetVariant {
            kind: VariantKind::GvizSheet,
            url: format!("{SHEETS_BASE}/{id}/gviz/tq?tqx=out:csv&sheet={name}"),
        },
        SheetVariant {
            kind: VariantKind::GvizGid,
            url: format!("{SHEETS_BASE}/{id}/gviz/tq?tqx=out:csv&gid=0"),
        },
    ]
}
