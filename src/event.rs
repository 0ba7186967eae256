//! The decoded event model.
//!
//! Every record in a buffer decodes to one [`LogEvent`]: an absolute
//! timestamp, the header of the buffer it came from, and an [`EventData`]
//! variant holding the kind-specific fields. Pointers, object addresses and
//! method ids are already resolved against their buffer bases.

use crate::framing::BufferHeader;
use crate::visitor::LogEventVisitor;
use std::sync::Arc;
use uuid::Uuid;

/// Declares a wire-coded enumeration that keeps unknown codes.
macro_rules! code_enum {
    (
        $(#[$meta:meta])*
        $name:ident: $repr:ty {
            $($(#[$vmeta:meta])* $variant:ident = $value:expr,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
            Unknown($repr),
        }

        impl $name {
            pub fn from_code(code: $repr) -> Self {
                match code {
                    $(v if v == $value => Self::$variant,)+
                    other => Self::Unknown(other),
                }
            }

            pub fn code(&self) -> $repr {
                match self {
                    $(Self::$variant => $value,)+
                    Self::Unknown(other) => *other,
                }
            }
        }
    };
}

code_enum! {
    /// Phase reported by a GC event.
    GcEventKind: u8 {
        Start = 0,
        MarkStart = 1,
        MarkEnd = 2,
        ReclaimStart = 3,
        ReclaimEnd = 4,
        End = 5,
        PreStopWorld = 6,
        PostStopWorld = 7,
        PreStartWorld = 8,
        PostStartWorld = 9,
        PreStopWorldLocked = 10,
        PostStartWorldUnlocked = 11,
    }
}

code_enum! {
    GcHandleType: u64 {
        Weak = 0,
        WeakTrackResurrection = 1,
        Normal = 2,
        Pinned = 3,
    }
}

code_enum! {
    ExceptionClauseKind: u8 {
        None = 0,
        Filter = 1,
        Finally = 2,
        Fault = 4,
    }
}

code_enum! {
    MonitorEventKind: u8 {
        Contention = 1,
        Done = 2,
        Fail = 3,
    }
}

code_enum! {
    /// Subsystem that registered a heap root.
    HeapRootSource: u8 {
        External = 0,
        Stack = 1,
        FinalizerQueue = 2,
        Static = 3,
        ThreadStatic = 4,
        ContextStatic = 5,
        GcHandle = 6,
        Jit = 7,
        Threading = 8,
        AppDomain = 9,
        Reflection = 10,
        Marshal = 11,
        ThreadPool = 12,
        Debugger = 13,
        Handle = 14,
        Ephemeron = 15,
        ToggleRef = 16,
    }
}

code_enum! {
    /// Kind of runtime-generated code buffer.
    JitHelperKind: u8 {
        Unspecified = 0,
        Method = 1,
        MethodTrampoline = 2,
        UnboxTrampoline = 3,
        ImtTrampoline = 4,
        GenericsTrampoline = 5,
        SpecificTrampoline = 6,
        Helper = 7,
        Monitor = 8,
        DelegateInvoke = 9,
        ExceptionHandling = 10,
    }
}

code_enum! {
    SyncPointKind: u8 {
        Periodic = 0,
        WorldStop = 1,
        WorldStart = 2,
    }
}

code_enum! {
    CounterType: u64 {
        Int32 = 0,
        UInt32 = 1,
        Word = 2,
        Int64 = 3,
        UInt64 = 4,
        Double = 5,
        String = 6,
        Interval = 7,
    }
}

code_enum! {
    CounterSection: u64 {
        Jit = 1 << 8,
        Gc = 1 << 9,
        Metadata = 1 << 10,
        Generics = 1 << 11,
        Security = 1 << 12,
        Runtime = 1 << 13,
        System = 1 << 14,
        User = 1 << 15,
        Profiler = 1 << 16,
    }
}

code_enum! {
    CounterUnit: u64 {
        Raw = 0,
        Bytes = 1 << 24,
        Time = 2 << 24,
        Count = 3 << 24,
        Percentage = 4 << 24,
    }
}

code_enum! {
    CounterVariance: u64 {
        Monotonic = 1 << 28,
        Constant = 1 << 29,
        Variable = 1 << 30,
    }
}

/// Heap root attribute bits, kept raw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HeapRootAttributes(pub u64);

impl HeapRootAttributes {
    pub const PINNING: u64 = 1 << 8;
    pub const WEAK_REF: u64 = 2 << 8;
    pub const INTERIOR: u64 = 4 << 8;

    pub fn bits(&self) -> u64 {
        self.0
    }

    pub fn contains(&self, flag: u64) -> bool {
        self.0 & flag == flag
    }
}

/// The type reference an allocation or heap object carries: a class pointer
/// up to format 14, a vtable pointer from 15 on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRef {
    Class(i64),
    VTable(i64),
}

/// A decoded event with its timestamp and source buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    pub timestamp: u64,
    pub buffer: Arc<BufferHeader>,
    pub data: EventData,
}

impl LogEvent {
    /// Calls the visitor method matching this event's kind.
    pub fn accept<V: LogEventVisitor + ?Sized>(&self, visitor: &mut V) {
        match &self.data {
            EventData::Allocation(e) => visitor.visit_allocation(self, e),
            EventData::Gc(e) => visitor.visit_gc(self, e),
            EventData::GcResize(e) => visitor.visit_gc_resize(self, e),
            EventData::GcMove(e) => visitor.visit_gc_move(self, e),
            EventData::GcHandleCreation(e) => visitor.visit_gc_handle_creation(self, e),
            EventData::GcHandleDeletion(e) => visitor.visit_gc_handle_deletion(self, e),
            EventData::FinalizeBegin => visitor.visit_finalize_begin(self),
            EventData::FinalizeEnd => visitor.visit_finalize_end(self),
            EventData::FinalizeObjectBegin(e) => visitor.visit_finalize_object_begin(self, e),
            EventData::FinalizeObjectEnd(e) => visitor.visit_finalize_object_end(self, e),
            EventData::ClassLoad(e) => visitor.visit_class_load(self, e),
            EventData::ImageLoad(e) => visitor.visit_image_load(self, e),
            EventData::ImageUnload(e) => visitor.visit_image_unload(self, e),
            EventData::AssemblyLoad(e) => visitor.visit_assembly_load(self, e),
            EventData::AssemblyUnload(e) => visitor.visit_assembly_unload(self, e),
            EventData::AppDomainLoad(e) => visitor.visit_app_domain_load(self, e),
            EventData::AppDomainUnload(e) => visitor.visit_app_domain_unload(self, e),
            EventData::AppDomainName(e) => visitor.visit_app_domain_name(self, e),
            EventData::ContextLoad(e) => visitor.visit_context_load(self, e),
            EventData::ContextUnload(e) => visitor.visit_context_unload(self, e),
            EventData::ThreadStart(e) => visitor.visit_thread_start(self, e),
            EventData::ThreadEnd(e) => visitor.visit_thread_end(self, e),
            EventData::ThreadName(e) => visitor.visit_thread_name(self, e),
            EventData::VTableLoad(e) => visitor.visit_vtable_load(self, e),
            EventData::Enter(e) => visitor.visit_enter(self, e),
            EventData::Leave(e) => visitor.visit_leave(self, e),
            EventData::ExceptionalLeave(e) => visitor.visit_exceptional_leave(self, e),
            EventData::Jit(e) => visitor.visit_jit(self, e),
            EventData::Throw(e) => visitor.visit_throw(self, e),
            EventData::ExceptionClause(e) => visitor.visit_exception_clause(self, e),
            EventData::Monitor(e) => visitor.visit_monitor(self, e),
            EventData::HeapBegin => visitor.visit_heap_begin(self),
            EventData::HeapEnd => visitor.visit_heap_end(self),
            EventData::HeapObject(e) => visitor.visit_heap_object(self, e),
            EventData::HeapRoots(e) => visitor.visit_heap_roots(self, e),
            EventData::HeapRootRegister(e) => visitor.visit_heap_root_register(self, e),
            EventData::HeapRootUnregister(e) => visitor.visit_heap_root_unregister(self, e),
            EventData::SampleHit(e) => visitor.visit_sample_hit(self, e),
            EventData::UnmanagedSymbol(e) => visitor.visit_unmanaged_symbol(self, e),
            EventData::UnmanagedBinary(e) => visitor.visit_unmanaged_binary(self, e),
            EventData::CounterDescriptions(e) => visitor.visit_counter_descriptions(self, e),
            EventData::CounterSamples(e) => visitor.visit_counter_samples(self, e),
            EventData::JitHelper(e) => visitor.visit_jit_helper(self, e),
            EventData::SynchronizationPoint(e) => visitor.visit_synchronization_point(self, e),
            EventData::AotId(e) => visitor.visit_aot_id(self, e),
        }
    }

    pub fn is_synchronization_point(&self) -> bool {
        matches!(self.data, EventData::SynchronizationPoint(_))
    }
}

/// Kind-specific event payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum EventData {
    Allocation(AllocationEvent),
    Gc(GcEvent),
    GcResize(GcResizeEvent),
    GcMove(GcMoveEvent),
    GcHandleCreation(GcHandleCreationEvent),
    GcHandleDeletion(GcHandleDeletionEvent),
    FinalizeBegin,
    FinalizeEnd,
    FinalizeObjectBegin(FinalizeObjectEvent),
    FinalizeObjectEnd(FinalizeObjectEvent),
    ClassLoad(ClassLoadEvent),
    ImageLoad(ImageEvent),
    ImageUnload(ImageEvent),
    AssemblyLoad(AssemblyEvent),
    AssemblyUnload(AssemblyEvent),
    AppDomainLoad(AppDomainEvent),
    AppDomainUnload(AppDomainEvent),
    AppDomainName(AppDomainNameEvent),
    ContextLoad(ContextEvent),
    ContextUnload(ContextEvent),
    ThreadStart(ThreadEvent),
    ThreadEnd(ThreadEvent),
    ThreadName(ThreadNameEvent),
    VTableLoad(VTableLoadEvent),
    Enter(MethodEvent),
    Leave(MethodEvent),
    ExceptionalLeave(MethodEvent),
    Jit(JitEvent),
    Throw(ThrowEvent),
    ExceptionClause(ExceptionClauseEvent),
    Monitor(MonitorEvent),
    HeapBegin,
    HeapEnd,
    HeapObject(HeapObjectEvent),
    HeapRoots(HeapRootsEvent),
    HeapRootRegister(HeapRootRegisterEvent),
    HeapRootUnregister(HeapRootUnregisterEvent),
    SampleHit(SampleHitEvent),
    UnmanagedSymbol(UnmanagedSymbolEvent),
    UnmanagedBinary(UnmanagedBinaryEvent),
    CounterDescriptions(CounterDescriptionsEvent),
    CounterSamples(CounterSamplesEvent),
    JitHelper(JitHelperEvent),
    SynchronizationPoint(SynchronizationPointEvent),
    AotId(AotIdEvent),
}

impl EventData {
    /// A stable name for the event kind.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Allocation(_) => "Allocation",
            Self::Gc(_) => "Gc",
            Self::GcResize(_) => "GcResize",
            Self::GcMove(_) => "GcMove",
            Self::GcHandleCreation(_) => "GcHandleCreation",
            Self::GcHandleDeletion(_) => "GcHandleDeletion",
            Self::FinalizeBegin => "FinalizeBegin",
            Self::FinalizeEnd => "FinalizeEnd",
            Self::FinalizeObjectBegin(_) => "FinalizeObjectBegin",
            Self::FinalizeObjectEnd(_) => "FinalizeObjectEnd",
            Self::ClassLoad(_) => "ClassLoad",
            Self::ImageLoad(_) => "ImageLoad",
            Self::ImageUnload(_) => "ImageUnload",
            Self::AssemblyLoad(_) => "AssemblyLoad",
            Self::AssemblyUnload(_) => "AssemblyUnload",
            Self::AppDomainLoad(_) => "AppDomainLoad",
            Self::AppDomainUnload(_) => "AppDomainUnload",
            Self::AppDomainName(_) => "AppDomainName",
            Self::ContextLoad(_) => "ContextLoad",
            Self::ContextUnload(_) => "ContextUnload",
            Self::ThreadStart(_) => "ThreadStart",
            Self::ThreadEnd(_) => "ThreadEnd",
            Self::ThreadName(_) => "ThreadName",
            Self::VTableLoad(_) => "VTableLoad",
            Self::Enter(_) => "Enter",
            Self::Leave(_) => "Leave",
            Self::ExceptionalLeave(_) => "ExceptionalLeave",
            Self::Jit(_) => "Jit",
            Self::Throw(_) => "Throw",
            Self::ExceptionClause(_) => "ExceptionClause",
            Self::Monitor(_) => "Monitor",
            Self::HeapBegin => "HeapBegin",
            Self::HeapEnd => "HeapEnd",
            Self::HeapObject(_) => "HeapObject",
            Self::HeapRoots(_) => "HeapRoots",
            Self::HeapRootRegister(_) => "HeapRootRegister",
            Self::HeapRootUnregister(_) => "HeapRootUnregister",
            Self::SampleHit(_) => "SampleHit",
            Self::UnmanagedSymbol(_) => "UnmanagedSymbol",
            Self::UnmanagedBinary(_) => "UnmanagedBinary",
            Self::CounterDescriptions(_) => "CounterDescriptions",
            Self::CounterSamples(_) => "CounterSamples",
            Self::JitHelper(_) => "JitHelper",
            Self::SynchronizationPoint(_) => "SynchronizationPoint",
            Self::AotId(_) => "AotId",
        }
    }
}

// === Allocation and GC ===

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationEvent {
    pub type_ref: TypeRef,
    pub object_pointer: i64,
    pub object_size: u64,
    /// Managed frames as method ids; empty when none was recorded.
    pub backtrace: Vec<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GcEvent {
    pub kind: GcEventKind,
    pub generation: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GcResizeEvent {
    pub new_size: u64,
}

/// Objects relocated by the collector; `old_object_pointers[i]` moved to
/// `new_object_pointers[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcMoveEvent {
    pub old_object_pointers: Vec<i64>,
    pub new_object_pointers: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcHandleCreationEvent {
    pub handle_type: GcHandleType,
    pub handle: u64,
    pub object_pointer: i64,
    pub backtrace: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcHandleDeletionEvent {
    pub handle_type: GcHandleType,
    pub handle: u64,
    pub backtrace: Vec<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalizeObjectEvent {
    pub object_pointer: i64,
}

// === Metadata ===

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLoadEvent {
    pub class_pointer: i64,
    pub image_pointer: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEvent {
    pub image_pointer: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyEvent {
    pub assembly_pointer: i64,
    /// Absent before format 14.
    pub image_pointer: Option<i64>,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppDomainEvent {
    pub app_domain_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDomainNameEvent {
    pub app_domain_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextEvent {
    pub context_id: i64,
    pub app_domain_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadEvent {
    pub thread_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadNameEvent {
    pub thread_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VTableLoadEvent {
    pub vtable_pointer: i64,
    pub app_domain_id: i64,
    pub class_pointer: i64,
}

// === Methods and exceptions ===

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodEvent {
    pub method_pointer: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JitEvent {
    pub method_pointer: i64,
    pub code_pointer: i64,
    pub code_size: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrowEvent {
    pub object_pointer: i64,
    pub backtrace: Vec<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionClauseEvent {
    pub clause_type: ExceptionClauseKind,
    pub index: u64,
    pub method_pointer: i64,
    /// The exception object; absent before format 14.
    pub object_pointer: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorEvent {
    pub kind: MonitorEventKind,
    pub object_pointer: i64,
    pub backtrace: Vec<i64>,
}

// === Heap ===

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapObjectEvent {
    pub object_pointer: i64,
    pub type_ref: TypeRef,
    pub object_size: u64,
    /// Present from format 16.
    pub generation: Option<u8>,
    pub references: Vec<HeapReference>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapReference {
    pub offset: u64,
    pub object_pointer: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapRootsEvent {
    /// Only recorded before format 15.
    pub max_generation_collection_count: Option<u64>,
    pub roots: Vec<HeapRoot>,
}

/// One heap root. Formats 13 and 14 describe roots by attributes and extra
/// info; from 15 on by the slot holding the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapRoot {
    pub slot_pointer: Option<i64>,
    pub object_pointer: i64,
    pub attributes: Option<HeapRootAttributes>,
    pub extra_info: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapRootRegisterEvent {
    pub root_pointer: i64,
    pub root_size: u64,
    pub source: HeapRootSource,
    pub key: i64,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapRootUnregisterEvent {
    pub root_pointer: i64,
}

// === Sampling and counters ===

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleHitEvent {
    pub thread_id: i64,
    /// Native frames as code addresses.
    pub unmanaged_backtrace: Vec<i64>,
    /// Managed frames as method ids.
    pub managed_backtrace: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmanagedSymbolEvent {
    pub code_pointer: i64,
    pub code_size: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmanagedBinaryEvent {
    pub segment_pointer: i64,
    pub segment_offset: u64,
    pub segment_size: u64,
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterDescriptionsEvent {
    pub descriptions: Vec<CounterDescription>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterDescription {
    pub section: CounterSection,
    /// Only user-section counters carry a section name.
    pub section_name: Option<String>,
    pub counter_name: String,
    pub counter_type: CounterType,
    pub unit: CounterUnit,
    pub variance: CounterVariance,
    pub index: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CounterSamplesEvent {
    pub samples: Vec<CounterSample>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CounterSample {
    pub index: u64,
    pub counter_type: CounterType,
    pub value: CounterValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CounterValue {
    Signed(i64),
    Unsigned(u64),
    Double(f64),
    /// `None` when the counter has no current string value.
    String(Option<String>),
}

// === Runtime and meta ===

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JitHelperEvent {
    pub helper_type: JitHelperKind,
    pub buffer_pointer: i64,
    pub buffer_size: u64,
    /// Only specific trampolines are named.
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynchronizationPointEvent {
    pub kind: SyncPointKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AotIdEvent {
    pub aot_id: Uuid,
}
