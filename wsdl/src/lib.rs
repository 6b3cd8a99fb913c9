use url::Url;

pub mod error;
pub mod graph;
pub mod parser;
pub mod types;

pub use graph::TypeGraph;
pub use types::{Definition, Namespaces};

const SOAP_HTTP_TRANSPORT: &str = "http://schemas.xmlsoap.org/wsdl/soap/http";

/// Fetches and parses a WSDL document, following `wsdl:import` and
/// `xsd:import`/`xsd:include` links relative to it.
///
/// The input may be an `http(s)` or `file` URL, or a bare filesystem path.
pub fn parse<S: AsRef<str>>(url: S) -> Result<(Definition, Namespaces), error::Error> {
    let url = match Url::parse(url.as_ref()) {
        Ok(url) => url,

        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let path = std::fs::canonicalize(url.as_ref())
                .map_err(|err| error::Error::PathConversionError(Some(err)))?;
            Url::from_file_path(path).map_err(|()| error::Error::PathConversionError(None))?
        }

        Err(err) => return Err(err.into()),
    };

    parser::parse(url)
}

/// Rejects bindings the generated client cannot speak: anything other
/// than document-style literal SOAP 1.1 over HTTP.
pub fn validate_binding(binding: &types::Binding) -> Result<(), error::Error> {
    let name = || format!("binding {}", binding.name.name);

    if binding.transport != SOAP_HTTP_TRANSPORT {
        return Err(error::Error::Unsupported {
            element: name(),
            detail: format!("transport {:?} (expected SOAP over HTTP)", binding.transport),
        });
    }

    if let Some(style) = binding.style.as_deref() {
        if style != "document" {
            return Err(error::Error::Unsupported {
                element: name(),
                detail: format!("{} style (only document is supported)", style),
            });
        }
    }

    for operation in &binding.operations {
        if let Some(style) = operation.style.as_deref() {
            if style != "document" {
                return Err(error::Error::Unsupported {
                    element: format!("operation {}", operation.name.name),
                    detail: format!("{} style (only document is supported)", style),
                });
            }
        }

        for body_use in [&operation.input_use, &operation.output_use]
            .into_iter()
            .flatten()
        {
            if body_use != "literal" {
                return Err(error::Error::Unsupported {
                    element: format!("operation {}", operation.name.name),
                    detail: format!("use={:?} (only literal is supported)", body_use),
                });
            }
        }
    }

    Ok(())
}
