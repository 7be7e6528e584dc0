/// How one sub-tag identifier takes part in optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubTagKind {
    pub id: &'static str,
    /// Output order among siblings, highest first
    pub weight: u8,
    /// Value may start with `NAMESPACE ` before the name
    pub allows_namespace: bool,
    /// Name and options may be derived from the primary kind
    pub derives_from_primary: bool,
}

/// Known kinds in processing order. The first entry is the primary.
pub const KINDS: &[SubTagKind] = &[
    SubTagKind {
        id: "xml",
        weight: 3,
        allows_namespace: true,
        derives_from_primary: false,
    },
    SubTagKind {
        id: "json",
        weight: 2,
        allows_namespace: false,
        derives_from_primary: true,
    },
    SubTagKind {
        id: "toml",
        weight: 1,
        allows_namespace: false,
        derives_from_primary: false,
    },
];

/// Types that only exist for the XML codec's own bookkeeping.
pub const INTERNAL_TYPES: &[&str] = &["xml.Name"];

pub const OMIT_EMPTY: &str = "omitempty";

pub fn kind_for(id: &str) -> Option<&'static SubTagKind> {
    KINDS.iter().find(|kind| kind.id == id)
}

pub fn primary() -> &'static SubTagKind {
    &KINDS[0]
}

pub fn is_internal_type(type_text: &str) -> bool {
    INTERNAL_TYPES.contains(&type_text)
}
