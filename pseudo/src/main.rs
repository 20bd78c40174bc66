#[cfg(feature = "cli")]
use anyhow::{Context, Result};
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a program and list its issues
    Check {
        /// Path of the pseudo file to read (stdin if omitted)
        file: Option<PathBuf>,
    },
    /// Print the script a program translates to
    Translate {
        /// Path of the pseudo file to read (stdin if omitted)
        file: Option<PathBuf>,
        /// Print the code and line mapping as JSON
        #[arg(long)]
        mapping: bool,
    },
    /// Run a program in the terminal, answering input prompts from stdin
    Run {
        /// Path of the pseudo file to read
        file: PathBuf,
        /// Execution budget in milliseconds (at least 1000)
        #[arg(short, long)]
        timeout: Option<u64>,
        /// Count time across input waits instead of restarting the budget
        #[arg(long)]
        cumulative_timeout: bool,
    },
    /// Speak the JSON-lines host protocol on stdin/stdout
    Serve {
        /// Count time across input waits instead of restarting the budget
        #[arg(long)]
        cumulative_timeout: bool,
    },
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("pseudo needs to be installed with the cli feature (`cargo install --force pseudo -F cli`)");
}

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> Result<()> {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let ok = match Args::parse().command {
        Command::Check { file } => check(&read_source(file.as_ref())?),
        Command::Translate { file, mapping } => translate(&read_source(file.as_ref())?, mapping)?,
        Command::Run {
            file,
            timeout,
            cumulative_timeout,
        } => {
            let source = read_source(Some(&file))?;
            let config = pseudo::config_for(timeout, policy(cumulative_timeout));
            run_interactive(&source, &config).await?
        }
        Command::Serve { cumulative_timeout } => {
            serve(policy(cumulative_timeout)).await?;
            true
        }
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn policy(cumulative: bool) -> pseudo::TimeoutPolicy {
    if cumulative {
        pseudo::TimeoutPolicy::Cumulative
    } else {
        pseudo::TimeoutPolicy::ResetAfterInput
    }
}

#[cfg(feature = "cli")]
fn read_source(file: Option<&PathBuf>) -> Result<String> {
    use std::io::Read;

    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("could not read {}", path.display())),
        None => {
            let mut source = String::new();
            std::io::stdin()
                .lock()
                .read_to_string(&mut source)
                .context("could not read program from stdin")?;
            Ok(source)
        }
    }
}

#[cfg(feature = "cli")]
fn check(source: &str) -> bool {
    let issues = pseudo::validate(source);
    if issues.is_empty() {
        println!("ok");
        return true;
    }
    println!("{}", pseudo::formatter::format_validation(&issues));
    !pseudo::has_errors(&issues)
}

#[cfg(feature = "cli")]
fn translate(source: &str, mapping: bool) -> Result<bool> {
    let issues = pseudo::validate(source);
    if pseudo::has_errors(&issues) {
        eprintln!("{}", pseudo::formatter::format_validation(&issues));
        return Ok(false);
    }
    for issue in &issues {
        eprintln!("{}", pseudo::formatter::format_warning(issue));
    }
    let program = pseudo::pseudo_grammar::try_translate(source)?;
    if mapping {
        println!("{}", serde_json::to_string_pretty(&program)?);
    } else {
        println!("{}", program.code);
    }
    Ok(true)
}

#[cfg(feature = "cli")]
async fn run_interactive(source: &str, config: &pseudo::SandboxConfig) -> Result<bool> {
    use pseudo::futures::StreamExt;
    use pseudo::ExecutionEvent;
    use std::io::Write;
    use tokio::io::{AsyncBufReadExt, BufReader};

    let mut execution = pseudo::run(source, config);
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut ok = true;

    while let Some(event) = execution.next().await {
        match event {
            ExecutionEvent::Stdout { text } => println!("{text}"),
            ExecutionEvent::Stderr { text } => eprintln!("{text}"),
            ExecutionEvent::InputRequest { id, prompt } => {
                if !prompt.is_empty() {
                    print!("{prompt} ");
                    std::io::stdout().flush()?;
                }
                let answer = stdin.next_line().await?.unwrap_or_default();
                execution.respond(&id, answer)?;
            }
            ExecutionEvent::Error { error } => {
                eprintln!("{error}");
                ok = false;
            }
            ExecutionEvent::Done => {}
        }
    }
    Ok(ok)
}

#[cfg(feature = "cli")]
async fn serve(policy: pseudo::TimeoutPolicy) -> Result<()> {
    use pseudo::futures::StreamExt;
    use pseudo::{ExecutionEvent, Server};
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};

    async fn emit(stdout: &mut Stdout, event: &ExecutionEvent) -> Result<()> {
        stdout.write_all(pseudo::encode_line(event)?.as_bytes()).await?;
        stdout.flush().await?;
        Ok(())
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut server = Server::new(policy);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if let Some(reply) = server.handle_line(&line) {
                    emit(&mut stdout, &reply).await?;
                }
            }
            Some(event) = server.next_event() => {
                emit(&mut stdout, &event).await?;
            }
        }
    }

    // Input is closed: let a running program finish unless it needs an answer.
    if let Some(mut execution) = server.into_running() {
        while let Some(event) = execution.next().await {
            let waiting = matches!(event, ExecutionEvent::InputRequest { .. });
            emit(&mut stdout, &event).await?;
            if waiting {
                break;
            }
        }
    }
    Ok(())
}
