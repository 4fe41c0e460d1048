use super::SchemaGenerator;
use crate::framework::Framework;
use crate::schema::{
    ApiSchema, BusinessLogicSchema, ComponentArchitectureSchema, DatabaseSchema, SchemaDocument,
};
use std::path::Path;

/// Stand-in for frameworks without extraction rules. Every document is a
/// header-only stub noted as pending.
pub struct PlaceholderGenerator {
    framework: Framework,
}

impl PlaceholderGenerator {
    pub fn new(framework: Framework) -> Self {
        Self { framework }
    }
}

impl SchemaGenerator for PlaceholderGenerator {
    fn framework(&self) -> Framework {
        self.framework
    }

    fn database(&self, _root: &Path) -> DatabaseSchema {
        DatabaseSchema::pending(self.framework)
    }

    fn api(&self, _root: &Path) -> ApiSchema {
        ApiSchema::pending(self.framework)
    }

    fn business_logic(&self, _root: &Path) -> BusinessLogicSchema {
        BusinessLogicSchema::pending(self.framework)
    }

    fn component_architecture(&self, _root: &Path) -> ComponentArchitectureSchema {
        ComponentArchitectureSchema::pending(self.framework)
    }
}
