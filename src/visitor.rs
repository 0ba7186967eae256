//! Callback surface for decoded events.

use crate::event::*;

/// Receives decoded events, one method per event kind.
///
/// `visit_before` and `visit_after` run around every event regardless of its
/// kind, which suits counting or filtering without per-kind code. Every
/// method defaults to doing nothing, so implementors override only what they
/// need.
///
/// Callbacks run synchronously on the processor's stack. A visitor that wants
/// concurrency has to hand events off itself.
#[allow(unused_variables)]
pub trait LogEventVisitor {
    fn visit_before(&mut self, event: &LogEvent) {}
    fn visit_after(&mut self, event: &LogEvent) {}

    fn visit_allocation(&mut self, event: &LogEvent, data: &AllocationEvent) {}
    fn visit_gc(&mut self, event: &LogEvent, data: &GcEvent) {}
    fn visit_gc_resize(&mut self, event: &LogEvent, data: &GcResizeEvent) {}
    fn visit_gc_move(&mut self, event: &LogEvent, data: &GcMoveEvent) {}
    fn visit_gc_handle_creation(&mut self, event: &LogEvent, data: &GcHandleCreationEvent) {}
    fn visit_gc_handle_deletion(&mut self, event: &LogEvent, data: &GcHandleDeletionEvent) {}
    fn visit_finalize_begin(&mut self, event: &LogEvent) {}
    fn visit_finalize_end(&mut self, event: &LogEvent) {}
    fn visit_finalize_object_begin(&mut self, event: &LogEvent, data: &FinalizeObjectEvent) {}
    fn visit_finalize_object_end(&mut self, event: &LogEvent, data: &FinalizeObjectEvent) {}

    fn visit_class_load(&mut self, event: &LogEvent, data: &ClassLoadEvent) {}
    fn visit_image_load(&mut self, event: &LogEvent, data: &ImageEvent) {}
    fn visit_image_unload(&mut self, event: &LogEvent, data: &ImageEvent) {}
    fn visit_assembly_load(&mut self, event: &LogEvent, data: &AssemblyEvent) {}
    fn visit_assembly_unload(&mut self, event: &LogEvent, data: &AssemblyEvent) {}
    fn visit_app_domain_load(&mut self, event: &LogEvent, data: &AppDomainEvent) {}
    fn visit_app_domain_unload(&mut self, event: &LogEvent, data: &AppDomainEvent) {}
    fn visit_app_domain_name(&mut self, event: &LogEvent, data: &AppDomainNameEvent) {}
    fn visit_context_load(&mut self, event: &LogEvent, data: &ContextEvent) {}
    fn visit_context_unload(&mut self, event: &LogEvent, data: &ContextEvent) {}
    fn visit_thread_start(&mut self, event: &LogEvent, data: &ThreadEvent) {}
    fn visit_thread_end(&mut self, event: &LogEvent, data: &ThreadEvent) {}
    fn visit_thread_name(&mut self, event: &LogEvent, data: &ThreadNameEvent) {}
    fn visit_vtable_load(&mut self, event: &LogEvent, data: &VTableLoadEvent) {}

    fn visit_enter(&mut self, event: &LogEvent, data: &MethodEvent) {}
    fn visit_leave(&mut self, event: &LogEvent, data: &MethodEvent) {}
    fn visit_exceptional_leave(&mut self, event: &LogEvent, data: &MethodEvent) {}
    fn visit_jit(&mut self, event: &LogEvent, data: &JitEvent) {}
    fn visit_throw(&mut self, event: &LogEvent, data: &ThrowEvent) {}
    fn visit_exception_clause(&mut self, event: &LogEvent, data: &ExceptionClauseEvent) {}
    fn visit_monitor(&mut self, event: &LogEvent, data: &MonitorEvent) {}

    fn visit_heap_begin(&mut self, event: &LogEvent) {}
    fn visit_heap_end(&mut self, event: &LogEvent) {}
    fn visit_heap_object(&mut self, event: &LogEvent, data: &HeapObjectEvent) {}
    fn visit_heap_roots(&mut self, event: &LogEvent, data: &HeapRootsEvent) {}
    fn visit_heap_root_register(&mut self, event: &LogEvent, data: &HeapRootRegisterEvent) {}
    fn visit_heap_root_unregister(&mut self, event: &LogEvent, data: &HeapRootUnregisterEvent) {}

    fn visit_sample_hit(&mut self, event: &LogEvent, data: &SampleHitEvent) {}
    fn visit_unmanaged_symbol(&mut self, event: &LogEvent, data: &UnmanagedSymbolEvent) {}
    fn visit_unmanaged_binary(&mut self, event: &LogEvent, data: &UnmanagedBinaryEvent) {}
    fn visit_counter_descriptions(&mut self, event: &LogEvent, data: &CounterDescriptionsEvent) {}
    fn visit_counter_samples(&mut self, event: &LogEvent, data: &CounterSamplesEvent) {}

    fn visit_jit_helper(&mut self, event: &LogEvent, data: &JitHelperEvent) {}
    fn visit_synchronization_point(&mut self, event: &LogEvent, data: &SynchronizationPointEvent) {}
    fn visit_aot_id(&mut self, event: &LogEvent, data: &AotIdEvent) {}
}

/// A visitor that ignores everything. Stands in for an absent visitor.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopVisitor;

impl LogEventVisitor for NoopVisitor {}

// Lets callers lend a visitor to a processor and inspect it afterwards.
impl<V: LogEventVisitor + ?Sized> LogEventVisitor for &mut V {
    fn visit_before(&mut self, event: &LogEvent) {
        (**self).visit_before(event)
    }

    fn visit_after(&mut self, event: &LogEvent) {
        (**self).visit_after(event)
    }

    fn visit_allocation(&mut self, event: &LogEvent, data: &AllocationEvent) {
        (**self).visit_allocation(event, data)
    }

    fn visit_gc(&mut self, event: &LogEvent, data: &GcEvent) {
        (**self).visit_gc(event, data)
    }

    fn visit_gc_resize(&mut self, event: &LogEvent, data: &GcResizeEvent) {
        (**self).visit_gc_resize(event, data)
    }

    fn visit_gc_move(&mut self, event: &LogEvent, data: &GcMoveEvent) {
        (**self).visit_gc_move(event, data)
    }

    fn visit_gc_handle_creation(&mut self, event: &LogEvent, data: &GcHandleCreationEvent) {
        (**self).visit_gc_handle_creation(event, data)
    }

    fn visit_gc_handle_deletion(&mut self, event: &LogEvent, data: &GcHandleDeletionEvent) {
        (**self).visit_gc_handle_deletion(event, data)
    }

    fn visit_finalize_begin(&mut self, event: &LogEvent) {
        (**self).visit_finalize_begin(event)
    }

    fn visit_finalize_end(&mut self, event: &LogEvent) {
        (**self).visit_finalize_end(event)
    }

    fn visit_finalize_object_begin(&mut self, event: &LogEvent, data: &FinalizeObjectEvent) {
        (**self).visit_finalize_object_begin(event, data)
    }

    fn visit_finalize_object_end(&mut self, event: &LogEvent, data: &FinalizeObjectEvent) {
        (**self).visit_finalize_object_end(event, data)
    }

    fn visit_class_load(&mut self, event: &LogEvent, data: &ClassLoadEvent) {
        (**self).visit_class_load(event, data)
    }

    fn visit_image_load(&mut self, event: &LogEvent, data: &ImageEvent) {
        (**self).visit_image_load(event, data)
    }

    fn visit_image_unload(&mut self, event: &LogEvent, data: &ImageEvent) {
        (**self).visit_image_unload(event, data)
    }

    fn visit_assembly_load(&mut self, event: &LogEvent, data: &AssemblyEvent) {
        (**self).visit_assembly_load(event, data)
    }

    fn visit_assembly_unload(&mut self, event: &LogEvent, data: &AssemblyEvent) {
        (**self).visit_assembly_unload(event, data)
    }

    fn visit_app_domain_load(&mut self, event: &LogEvent, data: &AppDomainEvent) {
        (**self).visit_app_domain_load(event, data)
    }

    fn visit_app_domain_unload(&mut self, event: &LogEvent, data: &AppDomainEvent) {
        (**self).visit_app_domain_unload(event, data)
    }

    fn visit_app_domain_name(&mut self, event: &LogEvent, data: &AppDomainNameEvent) {
        (**self).visit_app_domain_name(event, data)
    }

    fn visit_context_load(&mut self, event: &LogEvent, data: &ContextEvent) {
        (**self).visit_context_load(event, data)
    }

    fn visit_context_unload(&mut self, event: &LogEvent, data: &ContextEvent) {
        (**self).visit_context_unload(event, data)
    }

    fn visit_thread_start(&mut self, event: &LogEvent, data: &ThreadEvent) {
        (**self).visit_thread_start(event, data)
    }

    fn visit_thread_end(&mut self, event: &LogEvent, data: &ThreadEvent) {
        (**self).visit_thread_end(event, data)
    }

    fn visit_thread_name(&mut self, event: &LogEvent, data: &ThreadNameEvent) {
        (**self).visit_thread_name(event, data)
    }

    fn visit_vtable_load(&mut self, event: &LogEvent, data: &VTableLoadEvent) {
        (**self).visit_vtable_load(event, data)
    }

    fn visit_enter(&mut self, event: &LogEvent, data: &MethodEvent) {
        (**self).visit_enter(event, data)
    }

    fn visit_leave(&mut self, event: &LogEvent, data: &MethodEvent) {
        (**self).visit_leave(event, data)
    }

    fn visit_exceptional_leave(&mut self, event: &LogEvent, data: &MethodEvent) {
        (**self).visit_exceptional_leave(event, data)
    }

    fn visit_jit(&mut self, event: &LogEvent, data: &JitEvent) {
        (**self).visit_jit(event, data)
    }

    fn visit_throw(&mut self, event: &LogEvent, data: &ThrowEvent) {
        (**self).visit_throw(event, data)
    }

    fn visit_exception_clause(&mut self, event: &LogEvent, data: &ExceptionClauseEvent) {
        (**self).visit_exception_clause(event, data)
    }

    fn visit_monitor(&mut self, event: &LogEvent, data: &MonitorEvent) {
        (**self).visit_monitor(event, data)
    }

    fn visit_heap_begin(&mut self, event: &LogEvent) {
        (**self).visit_heap_begin(event)
    }

    fn visit_heap_end(&mut self, event: &LogEvent) {
        (**self).visit_heap_end(event)
    }

    fn visit_heap_object(&mut self, event: &LogEvent, data: &HeapObjectEvent) {
        (**self).visit_heap_object(event, data)
    }

    fn visit_heap_roots(&mut self, event: &LogEvent, data: &HeapRootsEvent) {
        (**self).visit_heap_roots(event, data)
    }

    fn visit_heap_root_register(&mut self, event: &LogEvent, data: &HeapRootRegisterEvent) {
        (**self).visit_heap_root_register(event, data)
    }

    fn visit_heap_root_unregister(&mut self, event: &LogEvent, data: &HeapRootUnregisterEvent) {
        (**self).visit_heap_root_unregister(event, data)
    }

    fn visit_sample_hit(&mut self, event: &LogEvent, data: &SampleHitEvent) {
        (**self).visit_sample_hit(event, data)
    }

    fn visit_unmanaged_symbol(&mut self, event: &LogEvent, data: &UnmanagedSymbolEvent) {
        (**self).visit_unmanaged_symbol(event, data)
    }

    fn visit_unmanaged_binary(&mut self, event: &LogEvent, data: &UnmanagedBinaryEvent) {
        (**self).visit_unmanaged_binary(event, data)
    }

    fn visit_counter_descriptions(&mut self, event: &LogEvent, data: &CounterDescriptionsEvent) {
        (**self).visit_counter_descriptions(event, data)
    }

    fn visit_counter_samples(&mut self, event: &LogEvent, data: &CounterSamplesEvent) {
        (**self).visit_counter_samples(event, data)
    }

    fn visit_jit_helper(&mut self, event: &LogEvent, data: &JitHelperEvent) {
        (**self).visit_jit_helper(event, data)
    }

    fn visit_synchronization_point(&mut self, event: &LogEvent, data: &SynchronizationPointEvent) {
        (**self).visit_synchronization_point(event, data)
    }

    fn visit_aot_id(&mut self, event: &LogEvent, data: &AotIdEvent) {
        (**self).visit_aot_id(event, data)
    }
}

/// Delivers one event: `visit_before`, the kind-specific method, then `visit_after`.
pub fn dispatch<V: LogEventVisitor + ?Sized>(visitor: &mut V, event: &LogEvent) {
    visitor.visit_before(event);
    event.accept(visitor);
    visitor.visit_after(event);
}
