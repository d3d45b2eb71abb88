use clap::{arg, Command, ValueEnum};
use crds::{IngressRoute, Middleware};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::CustomResourceExt;

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Crd {
    Middleware,
    #[clap(alias = "ingressroute", alias = "ingressRoute")]
    IngressRoute,
    All,
}

impl Crd {
    fn definitions(self) -> Vec<CustomResourceDefinition> {
        match self {
            Crd::Middleware => vec![Middleware::crd()],
            Crd::IngressRoute => vec![IngressRoute::crd()],
            Crd::All => vec![Middleware::crd(), IngressRoute::crd()],
        }
    }
}

fn cli() -> Command {
    Command::new("traefik-crd")
        .about("Print the Traefik CRD's understood by mlplatform-ingress")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("print")
                .about("Print a CRD")
                .arg(
                    arg!(<CRD>)
                        .value_parser(clap::value_parser!(Crd))
                        .required(true),
                )
                .arg(
                    arg!(--json)
                        .help("Print JSON instead of YAML")
                        .action(clap::ArgAction::SetTrue)
                        .required(false),
                ),
        )
}

fn render(definitions: &[CustomResourceDefinition], json: bool) -> Result<String, String> {
    let mut documents = Vec::with_capacity(definitions.len());
    for crd in definitions {
        let document = if json {
            serde_json::to_string_pretty(crd).map_err(|e| e.to_string())?
        } else {
            serde_yml::to_string(crd).map_err(|e| e.to_string())?
        };
        documents.push(document);
    }
    Ok(if json {
        documents.join("\n")
    } else {
        documents.join("---\n")
    })
}

fn main() {
    let matches = cli().get_matches();

    match matches.subcommand() {
        Some(("print", sub_matches)) => {
            let Some(crd) = sub_matches.get_one::<Crd>("CRD") else {
                unreachable!("CRD is a required argument")
            };
            match render(&crd.definitions(), sub_matches.get_flag("json")) {
                Ok(s) => println!("{}", s),
                Err(e) => {
                    eprintln!("Unable to serialize CRD: {}", e);
                    std::process::exit(1);
                }
            }
        }
        _ => unreachable!(),
    }
}
