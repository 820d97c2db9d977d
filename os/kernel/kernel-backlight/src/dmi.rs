//! Platform identity matching.

use core::fmt;

/// The SMBIOS strings the host reports for this machine.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DmiIdentity<'a> {
    pub sys_vendor: &'a str,
    pub product_name: &'a str,
    pub board_name: &'a str,
}

impl fmt::Display for DmiIdentity<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} (board {})",
            self.sys_vendor, self.product_name, self.board_name
        )
    }
}

/// One supported machine. Each non-empty field must occur in the
/// corresponding identity string.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DmiMatch {
    pub ident: &'static str,
    pub sys_vendor: &'static str,
    pub product_name: &'static str,
    pub board_name: &'static str,
}

impl DmiMatch {
    #[must_use]
    pub fn matches(&self, id: &DmiIdentity<'_>) -> bool {
        field_matches(self.sys_vendor, id.sys_vendor)
            && field_matches(self.product_name, id.product_name)
            && field_matches(self.board_name, id.board_name)
    }
}

fn field_matches(pattern: &str, value: &str) -> bool {
    pattern.is_empty() || value.contains(pattern)
}

const SAMSUNG: &str = "SAMSUNG ELECTRONICS CO., LTD.";

pub const SUPPORTED: &[DmiMatch] = &[
    DmiMatch {
        ident: "N120",
        sys_vendor: SAMSUNG,
        product_name: "N120",
        board_name: "N120",
    },
    DmiMatch {
        ident: "N130",
        sys_vendor: SAMSUNG,
        product_name: "N130",
        board_name: "N130",
    },
    DmiMatch {
        ident: "NC10",
        sys_vendor: SAMSUNG,
        product_name: "NC10",
        board_name: "NC10",
    },
];

/// First entry of [`SUPPORTED`] matching `id`.
#[must_use]
pub fn find_supported(id: &DmiIdentity<'_>) -> Option<&'static DmiMatch> {
    SUPPORTED.iter().find(|m| m.matches(id))
}
