use clap::{Args, Parser, Subcommand};
use reqwest::Method;
use serde_json::{Map, Value, json};

#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {message}")]
    ServerError { status: u16, message: String },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "classroom-cli", about = "Classroom particle board API CLI")]
struct Cli {
    #[arg(long, env = "CLASSROOM_BASE_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Ping,
    Class(ClassCommand),
    Student(StudentCommand),
    /// Lay out a class and persist the positions.
    Arrange(ArrangeArgs),
    /// Connection groups and colors for a class.
    Groups { class_id: i64 },
    /// Student name pairs that look alike.
    Similar {
        class_id: i64,
        #[arg(long, default_value_t = 0.5)]
        threshold: f64,
    },
}

#[derive(Args, Debug)]
struct ClassCommand {
    #[command(subcommand)]
    command: ClassSubcommand,
}

#[derive(Subcommand, Debug)]
enum ClassSubcommand {
    List,
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    Delete {
        class_id: i64,
    },
    /// Create one class per name.
    Batch {
        #[arg(required = true)]
        names: Vec<String>,
    },
}

#[derive(Args, Debug)]
struct StudentCommand {
    #[command(subcommand)]
    command: StudentSubcommand,
}

#[derive(Subcommand, Debug)]
enum StudentSubcommand {
    List {
        #[arg(long)]
        class_id: Option<i64>,
    },
    Create {
        name: String,
        #[arg(long)]
        class_id: Option<i64>,
        /// IDs of students this one is connected to.
        #[arg(long = "connect", value_delimiter = ',')]
        connections: Vec<i64>,
    },
    Delete {
        student_id: i64,
    },
    /// Save a student's position, as a drag would.
    Move {
        student_id: i64,
        x: f64,
        y: f64,
    },
}

#[derive(Args, Debug)]
struct ArrangeArgs {
    class_id: i64,
    #[arg(long)]
    mode: Option<String>,
    #[arg(long)]
    width: Option<f64>,
    #[arg(long)]
    height: Option<f64>,
    /// `preserve` keeps dragged positions, `reset` discards them.
    #[arg(long)]
    policy: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let base_url = cli.base_url;

    match cli.command {
        Command::Ping => run_ping(&base_url).await,
        Command::Class(class) => run_class(&base_url, class).await,
        Command::Student(student) => run_student(&base_url, student).await,
        Command::Arrange(args) => {
            let path = format!("/api/classes/{}/arrange", args.class_id);
            print_json(&api_request(&base_url, Method::POST, &path, &arrange_query(&args), None).await?)
        }
        Command::Groups { class_id } => {
            let path = format!("/api/classes/{class_id}/groups");
            print_json(&api_request(&base_url, Method::GET, &path, &[], None).await?)
        }
        Command::Similar { class_id, threshold } => {
            let path = format!("/api/classes/{class_id}/similar-names");
            let query = [("threshold", threshold.to_string())];
            print_json(&api_request(&base_url, Method::GET, &path, &query, None).await?)
        }
    }
}

async fn run_ping(base_url: &str) -> Result<(), CliError> {
    let client = reqwest::Client::new();
    let url = format!("{}/healthz", base_url.trim_end_matches('/'));
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(CliError::ServerError {
            status: status.as_u16(),
            message: "health check failed".to_owned(),
        });
    }
    println!("ok");
    Ok(())
}

async fn run_class(base_url: &str, class: ClassCommand) -> Result<(), CliError> {
    let json = match class.command {
        ClassSubcommand::List => api_request(base_url, Method::GET, "/api/classes", &[], None).await?,
        ClassSubcommand::Create { name, description } => {
            let mut body = Map::new();
            body.insert("name".to_owned(), Value::String(name));
            if let Some(description) = description {
                body.insert("description".to_owned(), Value::String(description));
            }
            api_request(base_url, Method::POST, "/api/classes", &[], Some(Value::Object(body))).await?
        }
        ClassSubcommand::Delete { class_id } => {
            let path = format!("/api/classes/{class_id}");
            api_request(base_url, Method::DELETE, &path, &[], None).await?
        }
        ClassSubcommand::Batch { names } => {
            let body = json!({ "names": names });
            api_request(base_url, Method::POST, "/api/classes/batch", &[], Some(body)).await?
        }
    };
    print_json(&json)
}

async fn run_student(base_url: &str, student: StudentCommand) -> Result<(), CliError> {
    let json = match student.command {
        StudentSubcommand::List { class_id } => {
            let query: Vec<(&str, String)> = class_id.map(|id| ("class_id", id.to_string())).into_iter().collect();
            api_request(base_url, Method::GET, "/api/students", &query, None).await?
        }
        StudentSubcommand::Create { name, class_id, connections } => {
            let body = student_body(name, class_id, connections);
            api_request(base_url, Method::POST, "/api/students", &[], Some(body)).await?
        }
        StudentSubcommand::Delete { student_id } => {
            let path = format!("/api/students/{student_id}");
            api_request(base_url, Method::DELETE, &path, &[], None).await?
        }
        StudentSubcommand::Move { student_id, x, y } => {
            let path = format!("/api/students/{student_id}/position");
            api_request(base_url, Method::PUT, &path, &[], Some(json!({ "x": x, "y": y }))).await?
        }
    };
    print_json(&json)
}

fn student_body(name: String, class_id: Option<i64>, connections: Vec<i64>) -> Value {
    let mut body = Map::new();
    body.insert("name".to_owned(), Value::String(name));
    if let Some(class_id) = class_id {
        body.insert("class_id".to_owned(), Value::from(class_id));
    }
    if !connections.is_empty() {
        body.insert("connections".to_owned(), Value::from(connections));
    }
    Value::Object(body)
}

/// Query params for the arrange endpoint: only the flags that were given.
fn arrange_query(args: &ArrangeArgs) -> Vec<(&'static str, String)> {
    [
        ("mode", args.mode.clone()),
        ("width", args.width.map(|w| w.to_string())),
        ("height", args.height.map(|h| h.to_string())),
        ("policy", args.policy.clone()),
    ]
    .into_iter()
    .filter_map(|(key, value)| Some((key, value?)))
    .collect()
}

async fn api_request(
    base_url: &str,
    method: Method,
    path: &str,
    query: &[(&str, String)],
    body: Option<Value>,
) -> Result<Value, CliError> {
    let client = reqwest::Client::new();
    let url = format!("{}{}", base_url.trim_end_matches('/'), path);

    let request = client.request(method, &url).query(query);
    let request = if let Some(json) = body { request.json(&json) } else { request };

    let response = request.send().await?;
    let status = response.status();
    let value = response.json::<Value>().await.unwrap_or(Value::Null);

    if !status.is_success() {
        let message = value
            .get("error")
            .and_then(Value::as_str)
            .map_or_else(|| value.to_string(), str::to_owned);
        return Err(CliError::ServerError { status: status.as_u16(), message });
    }

    Ok(value)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
