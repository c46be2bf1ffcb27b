use crate::descriptor::ToolDescriptor;
use crate::error::ToolError;

/// A fixed collection of related tools authored as one unit.
#[derive(Debug, Clone)]
pub struct ToolProvider {
    base_name: String,
    descriptors: Vec<ToolDescriptor>,
}

impl ToolProvider {
    pub fn new(base_name: impl Into<String>) -> Self {
        Self {
            base_name: base_name.into(),
            descriptors: Vec::new(),
        }
    }

    /// Add a descriptor. Unqualified names must be unique within the provider.
    pub fn register(&mut self, descriptor: ToolDescriptor) -> Result<&mut Self, ToolError> {
        if descriptor.name().trim().is_empty() {
            return Err(ToolError::Validation(format!(
                "provider '{}': tool name must not be empty",
                self.base_name
            )));
        }
        if self.get(descriptor.name()).is_some() {
            return Err(ToolError::Collision {
                name: descriptor.name().to_string(),
            });
        }
        self.descriptors.push(descriptor);
        Ok(self)
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.descriptors
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.descriptors.iter().find(|d| d.name() == name)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
