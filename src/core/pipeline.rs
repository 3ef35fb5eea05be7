//! Pipeline domain model - the step registry

use crate::core::{
    error::{PipelineError, StepRef},
    step::{Declaration, Slot, StepFn, StepId},
};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_PIPELINE_ID: AtomicU64 = AtomicU64::new(1);

/// A reserved step and, once registered, its declaration
#[derive(Debug, Clone)]
struct StepEntry {
    label: String,
    declaration: Option<Declaration>,
}

/// Registry of step declarations.
///
/// Steps are reserved with [`Pipeline::step`] (or [`Pipeline::declare`]) and
/// addressed only through the returned [`StepId`]. Declaration order has no
/// bearing on execution order.
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// Pipeline name
    pub name: String,

    id: u64,

    /// Arena of reserved steps, indexed by `StepId::index`
    steps: Vec<StepEntry>,

    /// Steps in the order their declarations were registered
    declaration_order: Vec<StepId>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: NEXT_PIPELINE_ID.fetch_add(1, Ordering::Relaxed),
            steps: Vec::new(),
            declaration_order: Vec::new(),
        }
    }

    /// Reserve a step identity without declaring it yet.
    ///
    /// Useful when a declaration has to reference a step declared further down.
    pub fn step(&mut self, label: impl Into<String>) -> StepId {
        let id = StepId::new(self.id, self.steps.len());
        self.steps.push(StepEntry {
            label: label.into(),
            declaration: None,
        });
        id
    }

    /// Attach a declaration to a reserved step
    pub fn register(
        &mut self,
        id: StepId,
        slots: Vec<Slot>,
        func: StepFn,
    ) -> Result<(), PipelineError> {
        let step_ref = self.step_ref(id);
        let entry = self
            .entry_mut(id)
            .ok_or_else(|| PipelineError::UnknownStep {
                step: step_ref.clone(),
                referenced_by: None,
            })?;

        if entry.declaration.is_some() {
            return Err(PipelineError::DuplicateStep { step: step_ref });
        }

        entry.declaration = Some(Declaration::new(slots, func));
        self.declaration_order.push(id);
        Ok(())
    }

    /// Reserve and declare a step in one call
    pub fn declare(&mut self, label: impl Into<String>, slots: Vec<Slot>, func: StepFn) -> StepId {
        let id = self.step(label);
        let entry = &mut self.steps[id.index()];
        entry.declaration = Some(Declaration::new(slots, func));
        self.declaration_order.push(id);
        id
    }

    /// Declared dependency slots of a step
    pub fn dependencies_of(&self, id: StepId) -> Result<&[Slot], PipelineError> {
        self.declaration(id).map(|decl| decl.slots.as_slice())
    }

    /// The function registered for a step
    pub fn step_fn(&self, id: StepId) -> Result<StepFn, PipelineError> {
        self.declaration(id).map(|decl| decl.func.clone())
    }

    fn declaration(&self, id: StepId) -> Result<&Declaration, PipelineError> {
        self.entry(id)
            .and_then(|entry| entry.declaration.as_ref())
            .ok_or_else(|| PipelineError::UnknownStep {
                step: self.step_ref(id),
                referenced_by: None,
            })
    }

    /// Check that every step reference points at a declared step
    pub fn validate(&self) -> Result<(), PipelineError> {
        for &id in &self.declaration_order {
            let declaration = self.declaration(id)?;
            for dep in declaration.dependencies() {
                if !self.is_declared(dep) {
                    return Err(PipelineError::UnknownStep {
                        step: self.step_ref(dep),
                        referenced_by: Some(self.step_ref(id)),
                    });
                }
            }
        }

        Ok(())
    }

    /// Whether `id` was issued by this pipeline and has a declaration
    pub fn is_declared(&self, id: StepId) -> bool {
        self.entry(id).is_some_and(|entry| entry.declaration.is_some())
    }

    /// Label of a step, if it was reserved by this pipeline
    pub fn label(&self, id: StepId) -> Option<&str> {
        self.entry(id).map(|entry| entry.label.as_str())
    }

    /// Identity plus label, for errors and events
    pub fn step_ref(&self, id: StepId) -> StepRef {
        match self.label(id) {
            Some(label) => StepRef::new(id, label),
            None => StepRef::unregistered(id),
        }
    }

    /// Declared steps in registration order
    pub fn declared_steps(&self) -> &[StepId] {
        &self.declaration_order
    }

    /// Number of declared steps
    pub fn len(&self) -> usize {
        self.declaration_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declaration_order.is_empty()
    }

    fn entry(&self, id: StepId) -> Option<&StepEntry> {
        if id.pipeline() != self.id {
            return None;
        }
        self.steps.get(id.index())
    }

    fn entry_mut(&mut self, id: StepId) -> Option<&mut StepEntry> {
        if id.pipeline() != self.id {
            return None;
        }
        self.steps.get_mut(id.index())
    }
}
