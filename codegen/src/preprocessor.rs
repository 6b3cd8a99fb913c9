//! Resolves the WSDL cross-reference web (port, binding, port type,
//! message, part) into a flat per-service call model the emitter can walk
//! without further lookups.

use std::collections::BTreeMap;

use lather_wsdl::{
    error,
    types::{Binding, Definition, Message, NamespacedName, PortType},
};
use tracing::warn;

use crate::{error::Error, naming, types::Options};

pub struct Model<'a> {
    pub services: Vec<ServiceModel<'a>>,
}

pub struct ServiceModel<'a> {
    pub name: &'a str,
    /// Output module (and file) name, after package overrides.
    pub module: String,
    pub ports: Vec<PortModel<'a>>,
}

pub struct PortModel<'a> {
    pub name: &'a str,
    pub location: &'a str,
    pub operations: Vec<OperationModel<'a>>,
}

pub struct OperationModel<'a> {
    pub name: &'a str,
    pub documentation: Option<&'a str>,
    pub action: &'a str,
    /// Wrapper element of the request message's single part.
    pub input: &'a NamespacedName,
    /// Wrapper element of the response message's single part.
    pub output: &'a NamespacedName,
}

fn find_binding<'a>(
    definition: &'a Definition,
    name: &NamespacedName,
) -> Result<&'a Binding, Error> {
    definition
        .bindings
        .iter()
        .find(|binding| binding.name == *name)
        .ok_or_else(|| {
            Error::Wsdl(error::Error::UnresolvedReference {
                kind: "binding",
                name: name.name.clone(),
            })
        })
}

fn find_port_type<'a>(
    definition: &'a Definition,
    name: &NamespacedName,
) -> Result<&'a PortType, Error> {
    definition
        .port_types
        .iter()
        .find(|port_type| port_type.name == *name)
        .ok_or_else(|| {
            Error::Wsdl(error::Error::UnresolvedReference {
                kind: "portType",
                name: name.name.clone(),
            })
        })
}

fn part_element<'a>(
    definition: &'a Definition,
    name: &NamespacedName,
) -> Result<&'a NamespacedName, Error> {
    let message: &Message = definition
        .messages
        .iter()
        .find(|message| message.name == *name)
        .ok_or_else(|| {
            Error::Wsdl(error::Error::UnresolvedReference {
                kind: "message",
                name: name.name.clone(),
            })
        })?;

    match message.parts.as_slice() {
        [part] => Ok(&part.element),
        parts => Err(Error::Wsdl(error::Error::Unsupported {
            element: format!("message {}", message.name.name),
            detail: format!(
                "wrapped document/literal needs exactly one part, found {}",
                parts.len()
            ),
        })),
    }
}

pub fn preprocess<'a>(
    definition: &'a Definition,
    options: &Options,
) -> Result<Model<'a>, Error> {
    let mut services = Vec::new();
    let mut modules: BTreeMap<String, &str> = BTreeMap::new();

    for service in &definition.services {
        let module = options
            .packages
            .get(&service.name.name)
            .cloned()
            .unwrap_or_else(|| naming::snake_case(&service.name.name));

        // Two services writing the same output file would silently clobber
        // each other.
        if let Some(first) = modules.insert(module.clone(), &service.name.name) {
            return Err(Error::DuplicateModule {
                module,
                first: first.to_owned(),
                second: service.name.name.clone(),
            });
        }

        let mut ports = Vec::new();

        for port in &service.ports {
            let binding = find_binding(definition, &port.binding)?;
            lather_wsdl::validate_binding(binding)?;

            let port_type = find_port_type(definition, &binding.ty)?;
            let mut operations = Vec::new();

            for operation in &port_type.operations {
                let (input, output) = match (&operation.input, &operation.output) {
                    (Some(input), Some(output)) => (input, output),
                    _ => {
                        warn!(
                            operation = operation.name.name.as_str(),
                            "skipping one-way operation"
                        );
                        continue;
                    }
                };

                let action = binding
                    .operations
                    .iter()
                    .find(|bound| bound.name.name == operation.name.name)
                    .map(|bound| bound.action.as_str())
                    .unwrap_or_else(|| {
                        warn!(
                            operation = operation.name.name.as_str(),
                            "operation missing from binding, using empty SOAPAction"
                        );
                        ""
                    });

                operations.push(OperationModel {
                    name: &operation.name.name,
                    documentation: operation.documentation.as_deref(),
                    action,
                    input: part_element(definition, input)?,
                    output: part_element(definition, output)?,
                });
            }

            ports.push(PortModel {
                name: &port.name.name,
                location: &port.location,
                operations,
            });
        }

        services.push(ServiceModel {
            name: &service.name.name,
            module,
            ports,
        });
    }

    Ok(Model { services })
}
