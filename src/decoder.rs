//! Event decoding.
//!
//! [`BufferDecoder`] turns the payload of one buffer into [`LogEvent`]s. It
//! owns the buffer's [`RunningCounters`], so time and method deltas chain
//! through that buffer only and start over with the next one.

use crate::config::MovePairPolicy;
use crate::error::{Error, Result};
use crate::event::*;
use crate::framing::{BufferHeader, RunningCounters, StreamHeader};
use crate::reader::LogReader;
use crate::schema::{
    FieldEncoding, FormatSchema, HeapRootsLayout, MonitorKindSource, TypeRefLayout,
};
use crate::tags::*;
use std::sync::Arc;
use uuid::Uuid;

/// Which kind of frames a backtrace holds, if one was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backtrace {
    Absent,
    Managed,
    Unmanaged,
}

impl Backtrace {
    fn managed_if(present: bool) -> Self {
        if present {
            Self::Managed
        } else {
            Self::Absent
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MetadataForm {
    Extra,
    Load,
    Unload,
}

/// Decodes the events of a single, fully materialised buffer.
pub struct BufferDecoder<'a> {
    stream: &'a StreamHeader,
    schema: FormatSchema,
    buffer: Arc<BufferHeader>,
    reader: LogReader<&'a [u8]>,
    counters: RunningCounters,
    move_pairs: MovePairPolicy,
}

impl<'a> BufferDecoder<'a> {
    /// Creates a decoder over `payload`, the bytes that followed `buffer`.
    pub fn new(
        stream: &'a StreamHeader,
        buffer: Arc<BufferHeader>,
        payload: &'a [u8],
    ) -> Result<Self> {
        Ok(Self {
            schema: stream.schema()?,
            stream,
            counters: buffer.counters(),
            buffer,
            reader: LogReader::new(payload),
            move_pairs: MovePairPolicy::default(),
        })
    }

    /// Reports error offsets relative to `offset` instead of the buffer start.
    pub fn with_base_offset(mut self, offset: u64) -> Self {
        let payload = self.reader.into_inner();
        self.reader = LogReader::with_offset(payload, offset);
        self
    }

    pub fn with_move_pairs(mut self, policy: MovePairPolicy) -> Self {
        self.move_pairs = policy;
        self
    }

    pub fn counters(&self) -> RunningCounters {
        self.counters
    }

    /// Payload bytes not yet decoded.
    pub fn remaining(&self) -> usize {
        self.reader.remaining()
    }

    /// Decodes the next event, or returns `Ok(None)` once the payload is used up.
    pub fn next_event(&mut self) -> Result<Option<LogEvent>> {
        if self.reader.is_empty() {
            return Ok(None);
        }
        self.decode_event().map(Some)
    }

    fn decode_event(&mut self) -> Result<LogEvent> {
        let offset = self.reader.offset();
        let tag = self.reader.read_u8()?;
        let basic = tag & BASIC_TYPE_MASK;
        let ext = tag & EXTENDED_TYPE_MASK;
        let timestamp = self.read_time()?;

        let data = match basic {
            TYPE_ALLOC => self.allocation(ext, offset)?,
            TYPE_GC => self.gc(ext, offset)?,
            TYPE_METADATA => self.metadata(ext, offset)?,
            TYPE_METHOD => self.method(ext, offset)?,
            TYPE_EXCEPTION => self.exception(ext, offset)?,
            TYPE_MONITOR => self.monitor(tag, offset)?,
            TYPE_HEAP => self.heap(ext, offset)?,
            TYPE_SAMPLE => self.sample(ext, offset)?,
            TYPE_RUNTIME => self.runtime(ext, offset)?,
            TYPE_META => self.meta(ext, offset)?,
            _ => return Err(Error::invalid_event_type(basic, ext, offset)),
        };

        Ok(LogEvent {
            timestamp,
            buffer: Arc::clone(&self.buffer),
            data,
        })
    }

    // --- Delta-resolved fields ---

    fn read_time(&mut self) -> Result<u64> {
        let delta = self.reader.read_uleb128()?;
        Ok(self.counters.advance_time(delta))
    }

    fn read_pointer(&mut self) -> Result<i64> {
        let ptr = self
            .reader
            .read_sleb128()?
            .wrapping_add(self.buffer.pointer_base);
        if self.stream.has_32bit_pointers() {
            Ok(ptr & 0xFFFF_FFFF)
        } else {
            Ok(ptr)
        }
    }

    fn read_object(&mut self) -> Result<i64> {
        let index = self
            .reader
            .read_sleb128()?
            .wrapping_add(self.buffer.object_base);
        Ok(index.wrapping_shl(3))
    }

    fn read_method(&mut self) -> Result<i64> {
        let delta = self.reader.read_sleb128()?;
        Ok(self.counters.advance_method(delta))
    }

    fn read_backtrace(&mut self, kind: Backtrace) -> Result<Vec<i64>> {
        if kind == Backtrace::Absent {
            return Ok(Vec::new());
        }
        let count = self.read_count()?;
        let mut frames = Vec::with_capacity(self.capacity_for(count));
        for _ in 0..count {
            frames.push(match kind {
                Backtrace::Unmanaged => self.read_pointer()?,
                _ => self.read_method()?,
            });
        }
        Ok(frames)
    }

    /// Reads a ULEB128 element count.
    fn read_count(&mut self) -> Result<usize> {
        Ok(self.reader.read_uleb128()? as usize)
    }

    /// Capacity hint for `count` elements; every element takes at least one byte.
    fn capacity_for(&self, count: usize) -> usize {
        count.min(self.reader.remaining())
    }

    fn read_type_ref(&mut self) -> Result<TypeRef> {
        let ptr = self.read_pointer()?;
        Ok(match self.schema.type_ref() {
            TypeRefLayout::ClassPointer => TypeRef::Class(ptr),
            TypeRefLayout::VTablePointer => TypeRef::VTable(ptr),
        })
    }

    fn read_encoded(&mut self, encoding: FieldEncoding) -> Result<u64> {
        match encoding {
            FieldEncoding::Byte => Ok(u64::from(self.reader.read_u8()?)),
            FieldEncoding::Uleb128 => self.reader.read_uleb128(),
        }
    }

    fn read_counter_field(&mut self) -> Result<u64> {
        self.read_encoded(self.schema.counter_fields())
    }

    // --- Per basic type ---

    fn allocation(&mut self, ext: u8, offset: u64) -> Result<EventData> {
        let backtrace = match ext {
            ALLOC_NO_BACKTRACE => false,
            ALLOC_BACKTRACE => true,
            _ => return Err(Error::invalid_event_type(TYPE_ALLOC, ext, offset)),
        };
        Ok(EventData::Allocation(AllocationEvent {
            type_ref: self.read_type_ref()?,
            object_pointer: self.read_object()?,
            object_size: self.reader.read_uleb128()?,
            backtrace: self.read_backtrace(Backtrace::managed_if(backtrace))?,
        }))
    }

    fn gc(&mut self, ext: u8, offset: u64) -> Result<EventData> {
        Ok(match ext {
            GC_EVENT => EventData::Gc(GcEvent {
                kind: GcEventKind::from_code(self.reader.read_u8()?),
                generation: self.reader.read_u8()?,
            }),
            GC_RESIZE => EventData::GcResize(GcResizeEvent {
                new_size: self.reader.read_uleb128()?,
            }),
            GC_MOVE => EventData::GcMove(self.gc_move()?),
            GC_HANDLE_CREATED | GC_HANDLE_CREATED_BACKTRACE => {
                EventData::GcHandleCreation(GcHandleCreationEvent {
                    handle_type: GcHandleType::from_code(self.reader.read_uleb128()?),
                    handle: self.reader.read_uleb128()?,
                    object_pointer: self.read_object()?,
                    backtrace: self.read_backtrace(Backtrace::managed_if(
                        ext == GC_HANDLE_CREATED_BACKTRACE,
                    ))?,
                })
            }
            GC_HANDLE_DESTROYED | GC_HANDLE_DESTROYED_BACKTRACE => {
                EventData::GcHandleDeletion(GcHandleDeletionEvent {
                    handle_type: GcHandleType::from_code(self.reader.read_uleb128()?),
                    handle: self.reader.read_uleb128()?,
                    backtrace: self.read_backtrace(Backtrace::managed_if(
                        ext == GC_HANDLE_DESTROYED_BACKTRACE,
                    ))?,
                })
            }
            GC_FINALIZE_START => EventData::FinalizeBegin,
            GC_FINALIZE_END => EventData::FinalizeEnd,
            GC_FINALIZE_OBJECT_START => EventData::FinalizeObjectBegin(FinalizeObjectEvent {
                object_pointer: self.read_object()?,
            }),
            GC_FINALIZE_OBJECT_END => EventData::FinalizeObjectEnd(FinalizeObjectEvent {
                object_pointer: self.read_object()?,
            }),
            _ => return Err(Error::invalid_event_type(TYPE_GC, ext, offset)),
        })
    }

    fn gc_move(&mut self) -> Result<GcMoveEvent> {
        let count = self.read_count()?;
        let mut objects = Vec::with_capacity(self.capacity_for(count));
        for _ in 0..count {
            objects.push(self.read_object()?);
        }

        if objects.len() % 2 != 0 {
            match self.move_pairs {
                MovePairPolicy::Reject => return Err(Error::UnpairedMoveList { count }),
                MovePairPolicy::Truncate => {
                    tracing::warn!(count, "dropping unpaired entry from GC move list");
                    objects.pop();
                }
            }
        }

        let mut event = GcMoveEvent {
            old_object_pointers: Vec::with_capacity(objects.len() / 2),
            new_object_pointers: Vec::with_capacity(objects.len() / 2),
        };
        for pair in objects.chunks_exact(2) {
            event.old_object_pointers.push(pair[0]);
            event.new_object_pointers.push(pair[1]);
        }
        Ok(event)
    }

    fn metadata(&mut self, ext: u8, offset: u64) -> Result<EventData> {
        let form = match ext {
            METADATA_EXTRA => MetadataForm::Extra,
            METADATA_END_LOAD => MetadataForm::Load,
            METADATA_END_UNLOAD => MetadataForm::Unload,
            _ => return Err(Error::invalid_event_type(TYPE_METADATA, ext, offset)),
        };
        let code = self.reader.read_u8()?;
        let unsupported = || Error::InvalidMetadataEvent {
            metadata_type: code,
            extended: ext,
            offset,
        };

        use MetadataForm::*;
        Ok(match (code, form) {
            (METADATA_CLASS, Load) => EventData::ClassLoad(ClassLoadEvent {
                class_pointer: self.read_pointer()?,
                image_pointer: self.read_pointer()?,
                name: self.reader.read_cstring()?,
            }),
            (METADATA_IMAGE, Load) => EventData::ImageLoad(self.image()?),
            (METADATA_IMAGE, Unload) => EventData::ImageUnload(self.image()?),
            (METADATA_ASSEMBLY, Load) => EventData::AssemblyLoad(self.assembly()?),
            (METADATA_ASSEMBLY, Unload) => EventData::AssemblyUnload(self.assembly()?),
            (METADATA_DOMAIN, Load) => EventData::AppDomainLoad(AppDomainEvent {
                app_domain_id: self.read_pointer()?,
            }),
            (METADATA_DOMAIN, Unload) => EventData::AppDomainUnload(AppDomainEvent {
                app_domain_id: self.read_pointer()?,
            }),
            (METADATA_DOMAIN, Extra) => EventData::AppDomainName(AppDomainNameEvent {
                app_domain_id: self.read_pointer()?,
                name: self.reader.read_cstring()?,
            }),
            (METADATA_THREAD, Load) => EventData::ThreadStart(ThreadEvent {
                thread_id: self.read_pointer()?,
            }),
            (METADATA_THREAD, Unload) => EventData::ThreadEnd(ThreadEvent {
                thread_id: self.read_pointer()?,
            }),
            (METADATA_THREAD, Extra) => EventData::ThreadName(ThreadNameEvent {
                thread_id: self.read_pointer()?,
                name: self.reader.read_cstring()?,
            }),
            (METADATA_CONTEXT, Load) => EventData::ContextLoad(self.context()?),
            (METADATA_CONTEXT, Unload) => EventData::ContextUnload(self.context()?),
            (METADATA_VTABLE, Load) => EventData::VTableLoad(VTableLoadEvent {
                vtable_pointer: self.read_pointer()?,
                app_domain_id: self.read_pointer()?,
                class_pointer: self.read_pointer()?,
            }),
            (
                METADATA_CLASS | METADATA_IMAGE | METADATA_ASSEMBLY | METADATA_CONTEXT
                | METADATA_VTABLE,
                _,
            ) => return Err(unsupported()),
            _ => return Err(Error::InvalidMetadataType { code, offset }),
        })
    }

    fn image(&mut self) -> Result<ImageEvent> {
        Ok(ImageEvent {
            image_pointer: self.read_pointer()?,
            name: self.reader.read_cstring()?,
        })
    }

    fn assembly(&mut self) -> Result<AssemblyEvent> {
        Ok(AssemblyEvent {
            assembly_pointer: self.read_pointer()?,
            image_pointer: if self.schema.assembly_has_image_pointer() {
                Some(self.read_pointer()?)
            } else {
                None
            },
            name: self.reader.read_cstring()?,
        })
    }

    fn context(&mut self) -> Result<ContextEvent> {
        Ok(ContextEvent {
            context_id: self.read_pointer()?,
            app_domain_id: self.read_pointer()?,
        })
    }

    fn method(&mut self, ext: u8, offset: u64) -> Result<EventData> {
        Ok(match ext {
            METHOD_LEAVE => EventData::Leave(MethodEvent {
                method_pointer: self.read_method()?,
            }),
            METHOD_ENTER => EventData::Enter(MethodEvent {
                method_pointer: self.read_method()?,
            }),
            METHOD_EXC_LEAVE => EventData::ExceptionalLeave(MethodEvent {
                method_pointer: self.read_method()?,
            }),
            METHOD_JIT => EventData::Jit(JitEvent {
                method_pointer: self.read_method()?,
                code_pointer: self.read_pointer()?,
                code_size: self.reader.read_uleb128()?,
                name: self.reader.read_cstring()?,
            }),
            _ => return Err(Error::invalid_event_type(TYPE_METHOD, ext, offset)),
        })
    }

    fn exception(&mut self, ext: u8, offset: u64) -> Result<EventData> {
        Ok(match ext {
            EXCEPTION_THROW_NO_BACKTRACE | EXCEPTION_THROW_BACKTRACE => {
                EventData::Throw(ThrowEvent {
                    object_pointer: self.read_object()?,
                    backtrace: self.read_backtrace(Backtrace::managed_if(
                        ext == EXCEPTION_THROW_BACKTRACE,
                    ))?,
                })
            }
            EXCEPTION_CLAUSE => EventData::ExceptionClause(ExceptionClauseEvent {
                clause_type: ExceptionClauseKind::from_code(self.reader.read_u8()?),
                index: self.reader.read_uleb128()?,
                method_pointer: self.read_method()?,
                object_pointer: if self.schema.clause_has_object() {
                    Some(self.read_object()?)
                } else {
                    None
                },
            }),
            _ => return Err(Error::invalid_event_type(TYPE_EXCEPTION, ext, offset)),
        })
    }

    fn monitor(&mut self, tag: u8, offset: u64) -> Result<EventData> {
        let ext = tag & EXTENDED_TYPE_MASK;
        let backtrace = ext & MONITOR_BACKTRACE != 0;
        let kind = match self.schema.monitor_kind() {
            // Bits 4-5 carry the kind; any combination is valid.
            MonitorKindSource::TagBits => MonitorEventKind::from_code((ext >> 4) & 0x3),
            MonitorKindSource::ExplicitByte => {
                if ext != MONITOR_NO_BACKTRACE && ext != MONITOR_BACKTRACE {
                    return Err(Error::invalid_event_type(TYPE_MONITOR, ext, offset));
                }
                MonitorEventKind::from_code(self.reader.read_u8()?)
            }
        };
        Ok(EventData::Monitor(MonitorEvent {
            kind,
            object_pointer: self.read_object()?,
            backtrace: self.read_backtrace(Backtrace::managed_if(backtrace))?,
        }))
    }

    fn heap(&mut self, ext: u8, offset: u64) -> Result<EventData> {
        Ok(match ext {
            HEAP_START => EventData::HeapBegin,
            HEAP_END => EventData::HeapEnd,
            HEAP_OBJECT => EventData::HeapObject(self.heap_object()?),
            HEAP_ROOTS => EventData::HeapRoots(self.heap_roots()?),
            HEAP_ROOT_REGISTER => EventData::HeapRootRegister(HeapRootRegisterEvent {
                root_pointer: self.read_pointer()?,
                root_size: self.reader.read_uleb128()?,
                source: HeapRootSource::from_code(self.reader.read_u8()?),
                key: self.read_pointer()?,
                name: self.reader.read_cstring()?,
            }),
            HEAP_ROOT_UNREGISTER => EventData::HeapRootUnregister(HeapRootUnregisterEvent {
                root_pointer: self.read_pointer()?,
            }),
            _ => return Err(Error::invalid_event_type(TYPE_HEAP, ext, offset)),
        })
    }

    fn heap_object(&mut self) -> Result<HeapObjectEvent> {
        let object_pointer = self.read_object()?;
        let type_ref = self.read_type_ref()?;
        let object_size = self.reader.read_uleb128()?;
        let generation = if self.schema.heap_object_has_generation() {
            Some(self.reader.read_u8()?)
        } else {
            None
        };

        let count = self.read_count()?;
        let mut references = Vec::with_capacity(self.capacity_for(count));
        for _ in 0..count {
            references.push(HeapReference {
                offset: self.reader.read_uleb128()?,
                object_pointer: self.read_object()?,
            });
        }

        Ok(HeapObjectEvent {
            object_pointer,
            type_ref,
            object_size,
            generation,
            references,
        })
    }

    fn heap_roots(&mut self) -> Result<HeapRootsEvent> {
        let count = self.read_count()?;
        let mut roots = Vec::with_capacity(self.capacity_for(count));

        match self.schema.heap_roots() {
            HeapRootsLayout::Attributed { attributes } => {
                let max_generation_collection_count = self.reader.read_uleb128()?;
                for _ in 0..count {
                    roots.push(HeapRoot {
                        slot_pointer: None,
                        object_pointer: self.read_object()?,
                        attributes: Some(HeapRootAttributes(self.read_encoded(attributes)?)),
                        extra_info: Some(self.reader.read_uleb128()?),
                    });
                }
                Ok(HeapRootsEvent {
                    max_generation_collection_count: Some(max_generation_collection_count),
                    roots,
                })
            }
            HeapRootsLayout::Slots => {
                for _ in 0..count {
                    roots.push(HeapRoot {
                        slot_pointer: Some(self.read_pointer()?),
                        object_pointer: self.read_object()?,
                        attributes: None,
                        extra_info: None,
                    });
                }
                Ok(HeapRootsEvent {
                    max_generation_collection_count: None,
                    roots,
                })
            }
        }
    }

    fn sample(&mut self, ext: u8, offset: u64) -> Result<EventData> {
        Ok(match ext {
            SAMPLE_HIT => {
                if self.schema.sample_hit_has_type_byte() {
                    self.reader.read_u8()?;
                }
                EventData::SampleHit(SampleHitEvent {
                    thread_id: self.read_pointer()?,
                    unmanaged_backtrace: self.read_backtrace(Backtrace::Unmanaged)?,
                    managed_backtrace: self.read_backtrace(Backtrace::Managed)?,
                })
            }
            SAMPLE_USYM => EventData::UnmanagedSymbol(UnmanagedSymbolEvent {
                code_pointer: self.read_pointer()?,
                code_size: self.reader.read_uleb128()?,
                name: self.reader.read_cstring()?,
            }),
            SAMPLE_UBIN => EventData::UnmanagedBinary(UnmanagedBinaryEvent {
                segment_pointer: if self.schema.unmanaged_binary_is_relative() {
                    self.read_pointer()?
                } else {
                    self.reader.read_sleb128()?
                },
                segment_offset: self.reader.read_uleb128()?,
                segment_size: self.reader.read_uleb128()?,
                file_name: self.reader.read_cstring()?,
            }),
            SAMPLE_COUNTERS_DESC => EventData::CounterDescriptions(self.counter_descriptions()?),
            SAMPLE_COUNTERS => EventData::CounterSamples(self.counter_samples()?),
            _ => return Err(Error::invalid_event_type(TYPE_SAMPLE, ext, offset)),
        })
    }

    fn counter_descriptions(&mut self) -> Result<CounterDescriptionsEvent> {
        let count = self.read_count()?;
        let mut descriptions = Vec::with_capacity(self.capacity_for(count));
        for _ in 0..count {
            let section = CounterSection::from_code(self.read_counter_field()?);
            descriptions.push(CounterDescription {
                section,
                section_name: if section == CounterSection::User {
                    Some(self.reader.read_cstring()?)
                } else {
                    None
                },
                counter_name: self.reader.read_cstring()?,
                counter_type: CounterType::from_code(self.read_counter_field()?),
                unit: CounterUnit::from_code(self.read_counter_field()?),
                variance: CounterVariance::from_code(self.read_counter_field()?),
                index: self.reader.read_uleb128()?,
            });
        }
        Ok(CounterDescriptionsEvent { descriptions })
    }

    fn counter_samples(&mut self) -> Result<CounterSamplesEvent> {
        let mut samples = Vec::new();
        loop {
            let index = self.reader.read_uleb128()?;
            if index == 0 {
                break;
            }
            let type_offset = self.reader.offset();
            let counter_type = CounterType::from_code(self.read_counter_field()?);
            let value = match counter_type {
                CounterType::String => {
                    if self.reader.read_u8()? == 1 {
                        CounterValue::String(Some(self.reader.read_cstring()?))
                    } else {
                        CounterValue::String(None)
                    }
                }
                CounterType::Int32 | CounterType::Word | CounterType::Int64 | CounterType::Interval => {
                    CounterValue::Signed(self.reader.read_sleb128()?)
                }
                CounterType::UInt32 | CounterType::UInt64 => {
                    CounterValue::Unsigned(self.reader.read_uleb128()?)
                }
                CounterType::Double => CounterValue::Double(self.reader.read_f64()?),
                CounterType::Unknown(code) => {
                    return Err(Error::InvalidCounterType {
                        code,
                        offset: type_offset,
                    })
                }
            };
            samples.push(CounterSample {
                index,
                counter_type,
                value,
            });
        }
        Ok(CounterSamplesEvent { samples })
    }

    fn runtime(&mut self, ext: u8, offset: u64) -> Result<EventData> {
        if ext != RUNTIME_JIT_HELPER {
            return Err(Error::invalid_event_type(TYPE_RUNTIME, ext, offset));
        }
        let helper_type = JitHelperKind::from_code(self.reader.read_u8()?);
        Ok(EventData::JitHelper(JitHelperEvent {
            helper_type,
            buffer_pointer: self.read_pointer()?,
            buffer_size: self.reader.read_uleb128()?,
            name: if helper_type == JitHelperKind::SpecificTrampoline {
                Some(self.reader.read_cstring()?)
            } else {
                None
            },
        }))
    }

    fn meta(&mut self, ext: u8, offset: u64) -> Result<EventData> {
        Ok(match ext {
            META_SYNC_POINT => EventData::SynchronizationPoint(SynchronizationPointEvent {
                kind: SyncPointKind::from_code(self.reader.read_u8()?),
            }),
            META_AOT_ID => {
                let text = self.reader.read_cstring()?;
                let aot_id = Uuid::parse_str(&text).map_err(|_| Error::InvalidAotId {
                    value: text.clone(),
                })?;
                EventData::AotId(AotIdEvent { aot_id })
            }
            _ => return Err(Error::invalid_event_type(TYPE_META, ext, offset)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::EventEncoder;

    fn stream(format_version: u8, pointer_size: u8) -> StreamHeader {
        StreamHeader {
            major_version: 6,
            minor_version: 0,
            format_version,
            pointer_size,
            startup_time: 0,
            timer_overhead: 0,
            flags: 0,
            process_id: 1,
            port: 0,
            arguments: String::new(),
            architecture: String::new(),
            operating_system: String::new(),
        }
    }

    fn buffer(pointer_base: i64, object_base: i64, method_base: i64) -> BufferHeader {
        BufferHeader {
            length: 0,
            time_base: 1_000,
            pointer_base,
            object_base,
            thread_id: 1,
            method_base,
        }
    }

    fn decode_all(stream: &StreamHeader, enc: EventEncoder) -> Result<Vec<LogEvent>> {
        let header = Arc::new(enc.header());
        let payload = enc.into_payload();
        let mut decoder = BufferDecoder::new(stream, header, &payload)?;
        let mut events = Vec::new();
        while let Some(event) = decoder.next_event()? {
            events.push(event);
        }
        Ok(events)
    }

    #[test]
    fn method_deltas_chain_through_the_buffer() {
        let s = stream(16, 8);
        let mut enc = EventEncoder::new(buffer(0, 0, 100));
        enc.event(TYPE_METHOD, METHOD_ENTER, 1_000);
        enc.sleb128(5);
        enc.event(TYPE_METHOD, METHOD_LEAVE, 1_000);
        enc.sleb128(-2);

        let events = decode_all(&s, enc).unwrap();
        let methods: Vec<i64> = events
            .iter()
            .map(|e| match &e.data {
                EventData::Enter(m) | EventData::Leave(m) => m.method_pointer,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(methods, vec![105, 103]);
    }

    #[test]
    fn time_deltas_accumulate() {
        let s = stream(16, 8);
        let mut enc = EventEncoder::new(buffer(0, 0, 0));
        enc.event(TYPE_HEAP, HEAP_START, 1_010);
        enc.event(TYPE_HEAP, HEAP_END, 1_500);
        let events = decode_all(&s, enc).unwrap();
        assert_eq!(events[0].timestamp, 1_010);
        assert_eq!(events[1].timestamp, 1_500);
    }

    #[test]
    fn pointers_are_masked_for_32bit_streams() {
        let s = stream(16, 4);
        let mut enc = EventEncoder::new(buffer(0x1_0000_0000, 0, 0));
        enc.event(TYPE_HEAP, HEAP_ROOT_UNREGISTER, 1_000);
        enc.sleb128(0x1234);

        let events = decode_all(&s, enc).unwrap();
        match &events[0].data {
            EventData::HeapRootUnregister(e) => assert_eq!(e.root_pointer, 0x1234),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn objects_are_rebased_and_shifted() {
        let s = stream(16, 8);
        let mut enc = EventEncoder::new(buffer(0, 0x100, 0));
        enc.event(TYPE_GC, GC_FINALIZE_OBJECT_START, 1_000);
        enc.sleb128(-0x10);

        let events = decode_all(&s, enc).unwrap();
        match &events[0].data {
            EventData::FinalizeObjectBegin(e) => assert_eq!(e.object_pointer, 0xF0 << 3),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn absent_backtrace_consumes_nothing() {
        let s = stream(15, 8);
        let mut enc = EventEncoder::new(buffer(0, 0, 0));
        enc.event(TYPE_EXCEPTION, EXCEPTION_THROW_NO_BACKTRACE, 1_000);
        enc.object(0x800);
        enc.event(TYPE_HEAP, HEAP_END, 1_001);

        let events = decode_all(&s, enc).unwrap();
        assert_eq!(events.len(), 2);
        match &events[0].data {
            EventData::Throw(t) => {
                assert_eq!(t.object_pointer, 0x800);
                assert!(t.backtrace.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_basic_type_names_code_and_offset() {
        let s = stream(14, 8);
        let mut enc = EventEncoder::new(buffer(0, 0, 0));
        enc.event(TYPE_HEAP, HEAP_END, 1_000);
        enc.event(0x0B, 0x20, 1_000);

        match decode_all(&s, enc) {
            Err(Error::InvalidEventType {
                basic: 0x0B,
                extended: 0x20,
                offset: 2,
            }) => {}
            other => panic!("expected InvalidEventType, got {other:?}"),
        }
    }

    #[test]
    fn odd_move_list_follows_policy() {
        let s = stream(16, 8);
        let build = || {
            let mut enc = EventEncoder::new(buffer(0, 0, 0));
            enc.event(TYPE_GC, GC_MOVE, 1_000);
            enc.uleb128(3);
            enc.object(0x10);
            enc.object(0x20);
            enc.object(0x30);
            enc
        };

        match decode_all(&s, build()) {
            Err(Error::UnpairedMoveList { count: 3 }) => {}
            other => panic!("expected UnpairedMoveList, got {other:?}"),
        }

        let enc = build();
        let header = Arc::new(enc.header());
        let payload = enc.into_payload();
        let mut decoder = BufferDecoder::new(&s, header, &payload)
            .unwrap()
            .with_move_pairs(MovePairPolicy::Truncate);
        let event = decoder.next_event().unwrap().unwrap();
        match event.data {
            EventData::GcMove(m) => {
                assert_eq!(m.old_object_pointers, vec![0x10]);
                assert_eq!(m.new_object_pointers, vec![0x20]);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(decoder.next_event().unwrap().is_none());
    }

    #[test]
    fn base_offset_shifts_reported_positions() {
        let s = stream(16, 8);
        let mut enc = EventEncoder::new(buffer(0, 0, 0));
        enc.event(TYPE_RUNTIME, 0x70, 1_000);
        let header = Arc::new(enc.header());
        let payload = enc.into_payload();
        let mut decoder = BufferDecoder::new(&s, header, &payload)
            .unwrap()
            .with_base_offset(500);
        match decoder.next_event() {
            Err(Error::InvalidEventType { offset: 500, .. }) => {}
            other => panic!("expected InvalidEventType at 500, got {other:?}"),
        }
    }
}
