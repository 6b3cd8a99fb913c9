use std::{path::PathBuf, process::exit};

use structopt::StructOpt;
use thiserror::Error;
use tracing::info;

use lather_codegen::{EnumStyle, Options, OptionalStyle};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "lather",
    about = "Generates typed SOAP clients from WSDL definitions"
)]
struct Args {
    /// WSDL documents (URLs or file paths) to generate clients from
    #[structopt(long = "wsdl", required = true, number_of_values = 1)]
    wsdl: Vec<String>,

    /// Directory the generated modules are written to
    #[structopt(long, default_value = ".", parse(from_os_str))]
    out: PathBuf,

    /// Module name override for a service, as Service=module
    #[structopt(long = "package", number_of_values = 1)]
    packages: Vec<String>,

    /// Identifier prefix for a namespace, as uri=prefix
    #[structopt(long = "namespace-prefix", number_of_values = 1)]
    namespace_prefixes: Vec<String>,

    /// Projection for optional fields: option, pointer or sentinel
    #[structopt(long = "optional-style", default_value = "option")]
    optional_style: String,

    /// Projection for enumerations: variant or string
    #[structopt(long = "enum-style", default_value = "variant")]
    enum_style: String,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Codegen(#[from] lather_codegen::Error),

    #[error("unable to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("generated code does not parse: {0}")]
    Parse(#[from] syn::Error),
}

const EXIT_UNSUPPORTED: i32 = 2;
const EXIT_IO: i32 = 3;
const EXIT_INVALID_OPTIONS: i32 = 4;

fn exit_code(err: &CliError) -> i32 {
    use lather_wsdl::error::Error as Wsdl;

    match err {
        // A duplicate module name is fixed with a --package override, so
        // it reports like the other option problems.
        CliError::Codegen(lather_codegen::Error::InvalidOption { .. })
        | CliError::Codegen(lather_codegen::Error::DuplicateModule { .. }) => {
            EXIT_INVALID_OPTIONS
        }

        CliError::Codegen(lather_codegen::Error::Wsdl(wsdl)) => match wsdl {
            Wsdl::UrlParseError(_)
            | Wsdl::PathConversionError(_)
            | Wsdl::FileOpenError(_)
            | Wsdl::ReqwestError(_)
            | Wsdl::UnsupportedScheme(_) => EXIT_IO,
            _ => EXIT_UNSUPPORTED,
        },

        CliError::Io { .. } => EXIT_IO,
        CliError::Parse(_) => EXIT_UNSUPPORTED,
    }
}

fn split_pair(value: &str, option: &'static str) -> Result<(String, String), CliError> {
    match value.split_once('=') {
        Some((key, mapped)) if !key.is_empty() && !mapped.is_empty() => {
            Ok((key.to_owned(), mapped.to_owned()))
        }
        _ => Err(lather_codegen::Error::InvalidOption {
            option,
            value: value.to_owned(),
        }
        .into()),
    }
}

fn build_options(args: &Args) -> Result<Options, CliError> {
    let mut options = Options {
        optional_style: args.optional_style.parse::<OptionalStyle>()?,
        enum_style: args.enum_style.parse::<EnumStyle>()?,
        ..Options::default()
    };

    for pair in &args.packages {
        let (service, module) = split_pair(pair, "package")?;
        options.packages.insert(service, module);
    }

    for pair in &args.namespace_prefixes {
        let (namespace, prefix) = split_pair(pair, "namespace-prefix")?;
        options.namespace_prefixes.insert(namespace, prefix);
    }

    Ok(options)
}

fn run(args: &Args) -> Result<(), CliError> {
    let options = build_options(args)?;

    std::fs::create_dir_all(&args.out).map_err(|source| CliError::Io {
        path: args.out.clone(),
        source,
    })?;

    for wsdl in &args.wsdl {
        info!(wsdl = wsdl.as_str(), "generating");
        let modules = lather_codegen::from_url(wsdl, &options)?;

        for module in modules {
            let file: syn::File = syn::parse2(module.tokens)?;
            let path = args.out.join(format!("{}.rs", module.name));

            std::fs::write(&path, prettyplease::unparse(&file)).map_err(|source| {
                CliError::Io {
                    path: path.clone(),
                    source,
                }
            })?;

            info!(path = %path.display(), "wrote module");
        }
    }

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = match Args::from_iter_safe(std::env::args()) {
        Ok(args) => args,
        Err(err) => {
            use structopt::clap::ErrorKind;
            if matches!(
                err.kind,
                ErrorKind::HelpDisplayed | ErrorKind::VersionDisplayed
            ) {
                println!("{}", err.message);
                return;
            }
            eprintln!("{}", err.message);
            exit(EXIT_INVALID_OPTIONS);
        }
    };

    if let Err(err) = run(&args) {
        eprintln!("error: {}", err);
        exit(exit_code(&err));
    }
}
