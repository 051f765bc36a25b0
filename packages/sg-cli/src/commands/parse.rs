use crate::cli::ParseArgs;
use crate::exit_codes;
use crate::output;
use serde::Serialize;
use sg_rs::validator::check_name;
use sg_rs::{BidsName, Entity};

#[derive(Serialize)]
struct ParseOutput {
    filename: String,
    subject: Option<String>,
    session: Option<String>,
    datatype: Option<String>,
    entities: Vec<Entity>,
    suffix: Option<String>,
    extension: Option<String>,
    /// Set when only the plain resolver could read the name.
    warning: Option<String>,
    error: Option<String>,
}

impl ParseOutput {
    fn resolve(filename: &str) -> Self {
        match BidsName::parse(filename) {
            Ok(name) => ParseOutput {
                filename: filename.to_string(),
                subject: Some(name.subject()),
                session: name.session().map(|s| format!("ses-{}", s)),
                datatype: Some(name.datatype().to_string()),
                entities: name.entities().to_vec(),
                suffix: Some(name.suffix().to_string()),
                extension: Some(name.extension().to_string()),
                warning: None,
                error: None,
            },
            Err(e) => {
                // Fall back to subject/datatype resolution, which reads any
                // name with an underscore in it.
                let check = check_name(filename);
                let (warning, error) = match check.error {
                    Some(err) => (None, Some(err)),
                    None => (Some(e.to_string()), None),
                };
                ParseOutput {
                    filename: filename.to_string(),
                    subject: check.subject,
                    session: None,
                    datatype: check.datatype,
                    entities: Vec::new(),
                    suffix: None,
                    extension: Some(check.extension),
                    warning,
                    error,
                }
            }
        }
    }
}

pub fn execute(args: ParseArgs) -> i32 {
    let results: Vec<ParseOutput> = args
        .filenames
        .iter()
        .map(|f| ParseOutput::resolve(f))
        .collect();
    let failed = results.iter().filter(|r| r.error.is_some()).count();

    if args.json {
        if let Err(code) = output::emit_json(&results, false, None) {
            return code;
        }
    } else {
        for result in &results {
            if let Some(ref err) = result.error {
                eprintln!("Error: {}", err);
                continue;
            }
            let entities: Vec<String> = result
                .entities
                .iter()
                .map(|e| format!("{}-{}", e.key, e.value))
                .collect();
            println!("{}", result.filename);
            println!("  subject:   {}", result.subject.as_deref().unwrap_or(""));
            if let Some(ref session) = result.session {
                println!("  session:   {}", session);
            }
            println!("  datatype:  {}", result.datatype.as_deref().unwrap_or(""));
            println!("  entities:  {}", entities.join(" "));
            println!("  suffix:    {}", result.suffix.as_deref().unwrap_or(""));
            println!("  extension: {}", result.extension.as_deref().unwrap_or(""));
            if let Some(ref warning) = result.warning {
                eprintln!("Warning: {}", warning);
            }
        }
    }

    if failed > 0 {
        exit_codes::INPUT_ERROR
    } else {
        exit_codes::SUCCESS
    }
}
