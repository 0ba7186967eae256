//! Wire-level tag constants.
//!
//! An event tag byte carries the basic type in its low nibble and the
//! extended type in its high nibble. A few kinds reuse bit 7 as a
//! "backtrace follows" flag.

pub const BASIC_TYPE_MASK: u8 = 0x0F;
pub const EXTENDED_TYPE_MASK: u8 = 0xF0;

// Basic types.
pub const TYPE_ALLOC: u8 = 0;
pub const TYPE_GC: u8 = 1;
pub const TYPE_METADATA: u8 = 2;
pub const TYPE_METHOD: u8 = 3;
pub const TYPE_EXCEPTION: u8 = 4;
pub const TYPE_MONITOR: u8 = 5;
pub const TYPE_HEAP: u8 = 6;
pub const TYPE_SAMPLE: u8 = 7;
pub const TYPE_RUNTIME: u8 = 8;
pub const TYPE_META: u8 = 10;

// TYPE_ALLOC
pub const ALLOC_NO_BACKTRACE: u8 = 0x00;
pub const ALLOC_BACKTRACE: u8 = 0x10;

// TYPE_GC
pub const GC_EVENT: u8 = 0x10;
pub const GC_RESIZE: u8 = 0x20;
pub const GC_MOVE: u8 = 0x30;
pub const GC_HANDLE_CREATED: u8 = 0x40;
pub const GC_HANDLE_DESTROYED: u8 = 0x50;
pub const GC_HANDLE_CREATED_BACKTRACE: u8 = 0x60;
pub const GC_HANDLE_DESTROYED_BACKTRACE: u8 = 0x70;
pub const GC_FINALIZE_START: u8 = 0x80;
pub const GC_FINALIZE_END: u8 = 0x90;
pub const GC_FINALIZE_OBJECT_START: u8 = 0xA0;
pub const GC_FINALIZE_OBJECT_END: u8 = 0xB0;

// TYPE_METADATA
pub const METADATA_EXTRA: u8 = 0x00;
pub const METADATA_END_LOAD: u8 = 0x20;
pub const METADATA_END_UNLOAD: u8 = 0x40;

// Metadata sub-kind byte.
pub const METADATA_CLASS: u8 = 1;
pub const METADATA_IMAGE: u8 = 2;
pub const METADATA_ASSEMBLY: u8 = 3;
pub const METADATA_DOMAIN: u8 = 4;
pub const METADATA_THREAD: u8 = 5;
pub const METADATA_CONTEXT: u8 = 6;
pub const METADATA_VTABLE: u8 = 7;

// TYPE_METHOD
pub const METHOD_LEAVE: u8 = 0x10;
pub const METHOD_ENTER: u8 = 0x20;
pub const METHOD_EXC_LEAVE: u8 = 0x30;
pub const METHOD_JIT: u8 = 0x40;

// TYPE_EXCEPTION
pub const EXCEPTION_THROW_NO_BACKTRACE: u8 = 0x00;
pub const EXCEPTION_THROW_BACKTRACE: u8 = 0x80;
pub const EXCEPTION_CLAUSE: u8 = 0x10;

// TYPE_MONITOR. Before format 14 bits 4-5 also carry the monitor event kind.
pub const MONITOR_NO_BACKTRACE: u8 = 0x00;
pub const MONITOR_BACKTRACE: u8 = 0x80;

// TYPE_HEAP
pub const HEAP_START: u8 = 0x00;
pub const HEAP_END: u8 = 0x10;
pub const HEAP_OBJECT: u8 = 0x20;
pub const HEAP_ROOTS: u8 = 0x30;
pub const HEAP_ROOT_REGISTER: u8 = 0x40;
pub const HEAP_ROOT_UNREGISTER: u8 = 0x50;

// TYPE_SAMPLE
pub const SAMPLE_HIT: u8 = 0x00;
pub const SAMPLE_USYM: u8 = 0x10;
pub const SAMPLE_UBIN: u8 = 0x20;
pub const SAMPLE_COUNTERS_DESC: u8 = 0x30;
pub const SAMPLE_COUNTERS: u8 = 0x40;

// TYPE_RUNTIME
pub const RUNTIME_JIT_HELPER: u8 = 0x10;

// TYPE_META
pub const META_SYNC_POINT: u8 = 0x00;
pub const META_AOT_ID: u8 = 0x10;

/// Builds a tag byte from its basic and extended parts.
pub const fn tag(basic: u8, extended: u8) -> u8 {
    (basic & BASIC_TYPE_MASK) | (extended & EXTENDED_TYPE_MASK)
}
