//! Version-keyed field layouts.
//!
//! The log format changed shape across revisions 13 to 16. Each decision the
//! decoder makes on the format version is answered here, so a revision's
//! layout can be checked without decoding anything.

use crate::error::{Error, Result};

pub const MIN_FORMAT_VERSION: u8 = 13;
pub const MAX_FORMAT_VERSION: u8 = 16;

/// How a small enumerated field is stored on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldEncoding {
    Byte,
    Uleb128,
}

/// Which type reference allocation and heap-object records carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRefLayout {
    ClassPointer,
    VTablePointer,
}

/// Where a monitor record keeps its event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorKindSource {
    /// Bits 4-5 of the tag byte; bit 7 flags a backtrace.
    TagBits,
    /// A dedicated byte after the time delta.
    ExplicitByte,
}

/// Layout of the heap roots record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeapRootsLayout {
    /// Collection count header, then (object, attributes, extra info) per root.
    Attributed { attributes: FieldEncoding },
    /// (slot pointer, object) per root.
    Slots,
}

/// The field layout of one format revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatSchema {
    version: u8,
}

impl FormatSchema {
    /// Returns the schema for `version`, or `UnsupportedFormatVersion`.
    pub fn new(version: u8) -> Result<Self> {
        if !(MIN_FORMAT_VERSION..=MAX_FORMAT_VERSION).contains(&version) {
            return Err(Error::UnsupportedFormatVersion {
                version,
                min: MIN_FORMAT_VERSION,
                max: MAX_FORMAT_VERSION,
            });
        }
        Ok(Self { version })
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn type_ref(&self) -> TypeRefLayout {
        if self.version < 15 {
            TypeRefLayout::ClassPointer
        } else {
            TypeRefLayout::VTablePointer
        }
    }

    pub fn heap_object_has_generation(&self) -> bool {
        self.version >= 16
    }

    /// Encoding of counter section, type, unit and variance fields.
    pub fn counter_fields(&self) -> FieldEncoding {
        if self.version < 15 {
            FieldEncoding::Byte
        } else {
            FieldEncoding::Uleb128
        }
    }

    pub fn monitor_kind(&self) -> MonitorKindSource {
        if self.version < 14 {
            MonitorKindSource::TagBits
        } else {
            MonitorKindSource::ExplicitByte
        }
    }

    pub fn assembly_has_image_pointer(&self) -> bool {
        self.version >= 14
    }

    pub fn clause_has_object(&self) -> bool {
        self.version >= 14
    }

    /// Revision 13 sample hits lead with a sample-type byte that is always "cycles".
    pub fn sample_hit_has_type_byte(&self) -> bool {
        self.version < 14
    }

    /// From 14 on, unmanaged binary segments are pointer-base relative.
    pub fn unmanaged_binary_is_relative(&self) -> bool {
        self.version >= 14
    }

    pub fn heap_roots(&self) -> HeapRootsLayout {
        match self.version {
            13 => HeapRootsLayout::Attributed {
                attributes: FieldEncoding::Byte,
            },
            14 => HeapRootsLayout::Attributed {
                attributes: FieldEncoding::Uleb128,
            },
            _ => HeapRootsLayout::Slots,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_versions_outside_range() {
        for version in [0, 12, 17, 255] {
            match FormatSchema::new(version) {
                Err(Error::UnsupportedFormatVersion { version: v, .. }) => assert_eq!(v, version),
                other => panic!("expected rejection of {version}, got {other:?}"),
            }
        }
    }

    #[test]
    fn version_13_layout() {
        let s = FormatSchema::new(13).unwrap();
        assert_eq!(s.type_ref(), TypeRefLayout::ClassPointer);
        assert_eq!(s.monitor_kind(), MonitorKindSource::TagBits);
        assert_eq!(s.counter_fields(), FieldEncoding::Byte);
        assert!(s.sample_hit_has_type_byte());
        assert!(!s.assembly_has_image_pointer());
        assert!(!s.clause_has_object());
        assert!(!s.unmanaged_binary_is_relative());
        assert!(!s.heap_object_has_generation());
        assert_eq!(
            s.heap_roots(),
            HeapRootsLayout::Attributed {
                attributes: FieldEncoding::Byte
            }
        );
    }

    #[test]
    fn version_14_layout() {
        let s = FormatSchema::new(14).unwrap();
        assert_eq!(s.type_ref(), TypeRefLayout::ClassPointer);
        assert_eq!(s.monitor_kind(), MonitorKindSource::ExplicitByte);
        assert_eq!(s.counter_fields(), FieldEncoding::Byte);
        assert!(!s.sample_hit_has_type_byte());
        assert!(s.assembly_has_image_pointer());
        assert!(s.clause_has_object());
        assert!(s.unmanaged_binary_is_relative());
        assert_eq!(
            s.heap_roots(),
            HeapRootsLayout::Attributed {
                attributes: FieldEncoding::Uleb128
            }
        );
    }

    #[test]
    fn version_15_and_16_layout() {
        let v15 = FormatSchema::new(15).unwrap();
        assert_eq!(v15.type_ref(), TypeRefLayout::VTablePointer);
        assert_eq!(v15.counter_fields(), FieldEncoding::Uleb128);
        assert_eq!(v15.heap_roots(), HeapRootsLayout::Slots);
        assert!(!v15.heap_object_has_generation());

        let v16 = FormatSchema::new(16).unwrap();
        assert!(v16.heap_object_has_generation());
        assert_eq!(v16.heap_roots(), HeapRootsLayout::Slots);
    }
}
