//! Attribute schema of the NWS WWA shapefile.
//!
//! Field names and widths match the published WWA product
//! (tgftp.nws.noaa.gov, DS.WWA). Every field is a character field; only
//! `PROD_TYPE` varies between generated features.

use crate::types::AttributeRecord;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    /// Maximum length in bytes
    pub width: u8,
    pub default: &'static str,
}

/// Field overridden with the category label on every record
pub const CATEGORY_FIELD: &str = "PROD_TYPE";

pub const WWA_FIELDS: [FieldDef; 10] = [
    FieldDef { name: "EXPIRATION", width: 25, default: "2019-10-30T01:00:00+00:00" },
    FieldDef { name: "SIG", width: 1, default: "W" },
    FieldDef { name: "WFO", width: 4, default: "KGYX" },
    FieldDef { name: "MSG_Type", width: 3, default: "XXX" },
    FieldDef { name: "PHENOM", width: 2, default: "XX" },
    FieldDef {
        name: "URL",
        width: 255,
        default: "https://alerts-v2.weather.gov/products/NWS-IDP-PROD-3891376-3315413",
    },
    FieldDef { name: CATEGORY_FIELD, width: 40, default: "" },
    FieldDef { name: "ISSUANCE", width: 25, default: "2019-10-29T19:00:00+00:00" },
    FieldDef { name: "WARNID", width: 31, default: "O.NEW.KFGZ.FW.W.0009.1572375600" },
    FieldDef { name: "EVENT", width: 4, default: "0009" },
];

pub fn field(name: &str) -> Option<&'static FieldDef> {
    WWA_FIELDS.iter().find(|f| f.name == name)
}

pub fn default_record() -> AttributeRecord {
    AttributeRecord::new(
        WWA_FIELDS
            .iter()
            .map(|f| (f.name, f.default.to_string()))
            .collect(),
    )
}

/// Fresh record for one category, built from the defaults.
pub fn record_for_category(defaults: &AttributeRecord, label: &str) -> AttributeRecord {
    let width = field(CATEGORY_FIELD).map(|f| f.width as usize).unwrap_or(usize::MAX);
    let value = fit_to_width(label, width);
    if value.len() < label.len() {
        warn!(label, width, "Category label exceeds {} width, truncating", CATEGORY_FIELD);
    }
    defaults.with_value(CATEGORY_FIELD, value)
}

/// Longest prefix of `value` that fits in `width` bytes without splitting a char.
pub fn fit_to_width(value: &str, width: usize) -> &str {
    if value.len() <= width {
        return value;
    }
    let mut end = width;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}
