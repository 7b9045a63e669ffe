use std::collections::HashMap;

use crate::block::{Block, BlockKind};
use crate::design::Design;
use crate::error::{DesignError, Warning};
use crate::id::{BlockId, PortRef};
use crate::port::{InputPort, OutputPort};
use crate::value::TypeDescriptor;

/// Declarative description of one block, produced by whatever front-end
/// builds the graph (out of scope for this crate). `inputs[i]` names the
/// spec index and output port of the driver for input `i`, if connected.
#[derive(Debug, Clone)]
pub struct DesignBlockSpec {
    pub class_tag: String,
    pub path: String,
    pub input_types: Vec<TypeDescriptor>,
    pub output_types: Vec<TypeDescriptor>,
    pub inputs: Vec<Option<(usize, usize)>>,
    pub params: BlockParams,
}

/// Construction parameters for each built-in block kind. A custom factory
/// registered for a user-defined class tag can ignore this and build
/// whatever `BlockKind` it needs from out-of-band data instead.
#[derive(Debug, Clone)]
pub enum BlockParams {
    Constant { values: Vec<crate::value::Value> },
    Delay { defaults: Vec<crate::value::Value>, dirty_on_change: bool },
    EnabledDelay { defaults: Vec<crate::value::Value>, dirty_on_change: bool },
    Memory { depth: usize, width: usize, fill: crate::value::Value },
    Terminate,
    Decide,
    Logger { capacity: usize },
    Generic { op: crate::blocks::generic::Op },
}

/// Builds a [`Block`] from a [`DesignBlockSpec`] (phase one), then wires
/// its inputs once every block in the batch has been created (phase two),
/// mirroring the C++ original's `CreateBlock`/`MapConnections` pair. A
/// factory for a user-defined class tag can override `map_connections` to
/// resolve its own driver references from out-of-band data instead of
/// `spec.inputs`, the hook the built-in factory doesn't need.
pub trait Factory {
    fn create(&self, spec: &DesignBlockSpec) -> Result<Block, DesignError>;

    /// Connects `block`'s inputs to the drivers `spec.inputs` names,
    /// resolving each driver's spec index to a `BlockId` through `mapping`
    /// (`None` for a spec index that produced no block, e.g. because no
    /// factory was registered for its class tag, in which case that input
    /// is left unconnected).
    fn map_connections(&self, design: &mut Design, block: BlockId, spec: &DesignBlockSpec, mapping: &dyn Fn(usize) -> Option<BlockId>) -> Result<(), DesignError> {
        for (input_index, driver) in spec.inputs.iter().enumerate() {
            let Some((source_spec_index, source_port)) = driver else { continue };
            let Some(source_id) = mapping(*source_spec_index) else { continue };
            design.connect(PortRef::new(block, input_index), PortRef::new(source_id, *source_port))?;
        }
        Ok(())
    }
}

/// A registered factory for each of the built-in class tags, returning the
/// `BlockKind` that `DesignBlockSpec::params` already describes.
struct BuiltinFactory;

impl Factory for BuiltinFactory {
    fn create(&self, spec: &DesignBlockSpec) -> Result<Block, DesignError> {
        let inputs = spec.input_types.iter().map(|t| InputPort::new(*t)).collect();
        let outputs: Vec<OutputPort> = spec.output_types.iter().map(|t| OutputPort::new(*t)).collect();
        let kind = match &spec.params {
            BlockParams::Constant { values } => BlockKind::Constant(crate::blocks::constant::Constant::new(values.clone())),
            BlockParams::Delay { defaults, dirty_on_change } => {
                BlockKind::Delay(crate::blocks::delay::Delay::new(defaults.clone(), *dirty_on_change))
            }
            BlockParams::EnabledDelay { defaults, dirty_on_change } => {
                BlockKind::EnabledDelay(crate::blocks::delay::EnabledDelay::new(defaults.clone(), *dirty_on_change))
            }
            BlockParams::Memory { depth, width, fill } => {
                // rdAddress/wrAddress are inputs 1 and 2 in the fixed layout
                // documented on `blocks::memory::Memory`; validated here,
                // at construction, rather than left to fail later inside
                // `Memory::step`.
                let rd_addr_ty = spec.input_types.get(1).ok_or_else(|| DesignError::InvalidType {
                    message: format!("{}: memory block is missing its rdAddress input", spec.path),
                })?;
                rd_addr_ty.validate_as_address()?;
                let wr_addr_ty = spec.input_types.get(2).ok_or_else(|| DesignError::InvalidType {
                    message: format!("{}: memory block is missing its wrAddress input", spec.path),
                })?;
                wr_addr_ty.validate_as_address()?;
                BlockKind::Memory(crate::blocks::memory::Memory::new(spec.path.clone(), *depth, *width, fill.clone()))
            }
            BlockParams::Terminate => BlockKind::Terminate(crate::blocks::terminate::Terminate::new()),
            BlockParams::Decide => BlockKind::Decide(crate::blocks::decide::Decide::new()),
            BlockParams::Logger { capacity } => BlockKind::Logger(crate::blocks::logger::Logger::new(*capacity)),
            BlockParams::Generic { op } => BlockKind::Generic(crate::blocks::generic::Generic::new(*op)),
        };
        Ok(Block::new(spec.path.clone(), inputs, outputs, kind))
    }
}

/// Maps class tags to factories. Grounded on `factorial-core/src/registry.rs`'s
/// registry pattern: registering an existing tag replaces the prior entry.
pub struct Registry {
    factories: HashMap<String, Box<dyn Factory>>,
}

impl Default for Registry {
    fn default() -> Self {
        let mut r = Registry { factories: HashMap::new() };
        for tag in ["Constant", "Delay", "EnabledDelay", "Memory", "Terminate", "Decide", "Logger", "Generic"] {
            r.factories.insert(tag.to_string(), Box::new(BuiltinFactory));
        }
        r
    }
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// Registers `factory` for `class_tag`, replacing any prior entry.
    /// Returns `true` when a prior factory was replaced.
    pub fn register_factory(&mut self, class_tag: impl Into<String>, factory: Box<dyn Factory>) -> bool {
        self.factories.insert(class_tag.into(), factory).is_some()
    }

    /// Translates a flat list of [`DesignBlockSpec`]s into a [`Design`] in
    /// two phases: each spec is turned into a `Block` first (phase one),
    /// then every block's `Factory::map_connections` resolves and connects
    /// its own inputs (phase two), since a spec may reference a later one.
    pub fn translate(&self, specs: &[DesignBlockSpec]) -> Result<(Design, Vec<Warning>), DesignError> {
        let mut design = Design::new();
        let mut warnings = Vec::new();
        let mut id_of: Vec<Option<BlockId>> = Vec::with_capacity(specs.len());

        for spec in specs {
            match self.factories.get(&spec.class_tag) {
                Some(factory) => {
                    let block = factory.create(spec)?;
                    id_of.push(Some(design.insert(block)));
                }
                None => {
                    warnings.push(Warning {
                        class_tag: spec.class_tag.clone(),
                        path: spec.path.clone(),
                        message: "no factory registered for class tag; block skipped".into(),
                    });
                    id_of.push(None);
                }
            }
        }

        let mapping = |source_spec_index: usize| id_of.get(source_spec_index).copied().flatten();
        for (spec_index, spec) in specs.iter().enumerate() {
            let Some(this_id) = id_of[spec_index] else { continue };
            let factory = self.factories.get(&spec.class_tag).expect("a block was only created from a registered factory");
            factory.map_connections(&mut design, this_id, spec, &mapping)?;
        }

        Ok((design, warnings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn constant_spec(path: &str, value: Value) -> DesignBlockSpec {
        DesignBlockSpec {
            class_tag: "Constant".into(),
            path: path.into(),
            input_types: vec![],
            output_types: vec![value.type_descriptor()],
            inputs: vec![],
            params: BlockParams::Constant { values: vec![value] },
        }
    }

    fn terminate_spec(path: &str, driver: (usize, usize)) -> DesignBlockSpec {
        DesignBlockSpec {
            class_tag: "Terminate".into(),
            path: path.into(),
            input_types: vec![TypeDescriptor::Bool],
            output_types: vec![],
            inputs: vec![Some(driver)],
            params: BlockParams::Terminate,
        }
    }

    #[test]
    fn translate_wires_connections() {
        let registry = Registry::new();
        let specs = vec![constant_spec("c", Value::Bool(true)), terminate_spec("t", (0, 0))];
        let (design, warnings) = registry.translate(&specs).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(design.len(), 2);
    }

    #[test]
    fn unknown_class_tag_warns_and_skips() {
        let registry = Registry::new();
        let specs = vec![DesignBlockSpec {
            class_tag: "Mystery".into(),
            path: "m".into(),
            input_types: vec![],
            output_types: vec![],
            inputs: vec![],
            params: BlockParams::Terminate,
        }];
        let (design, warnings) = registry.translate(&specs).unwrap();
        assert_eq!(design.len(), 0);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn register_factory_replaces_existing() {
        let mut registry = Registry::new();
        let replaced = registry.register_factory("Constant", Box::new(BuiltinFactory));
        assert!(replaced);
        let added = registry.register_factory("Brand-new", Box::new(BuiltinFactory));
        assert!(!added);
    }

    fn memory_spec(path: &str, rd_addr_ty: TypeDescriptor, wr_addr_ty: TypeDescriptor) -> DesignBlockSpec {
        DesignBlockSpec {
            class_tag: "Memory".into(),
            path: path.into(),
            input_types: vec![TypeDescriptor::Bool, rd_addr_ty, wr_addr_ty, TypeDescriptor::Bool, TypeDescriptor::I64],
            output_types: vec![TypeDescriptor::I64],
            inputs: vec![None, None, None, None, None],
            params: BlockParams::Memory {
                depth: 4,
                width: 1,
                fill: Value::I64(0),
            },
        }
    }

    #[test]
    fn memory_with_non_address_type_is_rejected_at_construction() {
        let registry = Registry::new();
        let specs = vec![memory_spec("mem", TypeDescriptor::I64, TypeDescriptor::I64)];
        let err = registry.translate(&specs).unwrap_err();
        assert!(matches!(err, DesignError::InvalidType { .. }));
    }

    #[test]
    fn memory_with_valid_address_type_translates() {
        let registry = Registry::new();
        let addr_ty = TypeDescriptor::DynFix {
            signed: false,
            word_width: 8,
            fractional: 0,
        };
        let specs = vec![memory_spec("mem", addr_ty, addr_ty)];
        let (design, warnings) = registry.translate(&specs).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(design.len(), 1);
    }

    /// A host-registered factory for an extension class tag resolves its
    /// own connections in `map_connections` rather than going through
    /// `spec.inputs`, proving the hook is actually reachable from
    /// `Registry::translate`'s second pass.
    struct ExternalDrivenFactory {
        called: std::rc::Rc<std::cell::Cell<bool>>,
    }

    impl Factory for ExternalDrivenFactory {
        fn create(&self, spec: &DesignBlockSpec) -> Result<Block, DesignError> {
            Ok(Block::new(spec.path.clone(), vec![], vec![OutputPort::new(TypeDescriptor::Bool)], BlockKind::Constant(crate::blocks::constant::Constant::new(vec![Value::Bool(true)]))))
        }

        fn map_connections(&self, _design: &mut Design, _block: BlockId, _spec: &DesignBlockSpec, _mapping: &dyn Fn(usize) -> Option<BlockId>) -> Result<(), DesignError> {
            self.called.set(true);
            Ok(())
        }
    }

    #[test]
    fn custom_factory_map_connections_hook_is_reachable() {
        let mut registry = Registry::new();
        let called = std::rc::Rc::new(std::cell::Cell::new(false));
        registry.register_factory("External", Box::new(ExternalDrivenFactory { called: called.clone() }));
        let specs = vec![DesignBlockSpec {
            class_tag: "External".into(),
            path: "ext".into(),
            input_types: vec![],
            output_types: vec![TypeDescriptor::Bool],
            inputs: vec![],
            params: BlockParams::Terminate,
        }];
        registry.translate(&specs).unwrap();
        assert!(called.get());
    }
}
