//! A terminal chat with Gemini models, built on the `gemchat` library.

#[macro_use]
extern crate tracing;

use std::io::Write as _;
use std::time::Duration;

use gemchat::attachment::load_image;
use gemchat::command::{Command, USAGE};
use gemchat::config::EnvConfig;
use gemchat::core::{Chat, DataState, Summarizer};
use gemchat::{Session, SessionBuilder};
use gemchat_gemini_model::GeminiProvider;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt, BufReader, Stdin};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;

const BAR_CHAR: &str = "▎";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match EnvConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return;
        }
    };
    let model_provider = GeminiProvider::new(config.gemini_config());

    let (delta_tx, mut delta_rx) = mpsc::unbounded_channel();
    let session = SessionBuilder::with_model_provider(model_provider)
        .with_settings(config.model_settings())
        .on_delta(move |delta| {
            delta_tx.send(delta.to_owned()).ok();
        })
        .build();

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    println!("{}", "Type /help for commands.".dimmed());
    let mut stdin = BufReader::new(io::stdin());

    loop {
        print_prompt(&session);
        let Some(line) = read_line(&mut stdin).await else {
            break;
        };
        let command = match Command::parse(&line) {
            None => continue,
            Some(Ok(command)) => command,
            Some(Err(message)) => {
                print_error(&message);
                continue;
            }
        };

        let chat = session.chat();
        match command {
            Command::Send(text) => {
                chat.update_draft_text(text);
                if let Err(err) = chat.submit_draft() {
                    print_error(&err.to_string());
                    continue;
                }
                wait_for_reply(chat, &mut delta_rx, &progress_style).await;
            }
            Command::NewConversation => {
                chat.start_new_conversation();
                print_info("Started a new conversation.");
            }
            Command::SelectModel(variant) => {
                chat.select_model(variant);
                print_info(&format!(
                    "Switched to the {variant} model, started a new \
                     conversation."
                ));
            }
            Command::SetKey(key) => {
                session.set_credential(key);
                print_info("API key updated.");
            }
            Command::Attach(path) => match load_image(&path).await {
                Ok(image) => {
                    chat.attach_images([image]);
                    let count = chat.snapshot().draft().images().len();
                    print_info(&format!(
                        "Attached {}, {count} image(s) in the draft.",
                        path.display()
                    ));
                    if !chat.active_model().supports_images() {
                        print_info(
                            "The pro model reads text only, use /model vision \
                             to send images.",
                        );
                    }
                }
                Err(err) => print_error(&err.to_string()),
            },
            Command::Detach(index) => {
                let snapshot = chat.snapshot();
                match snapshot.draft().images().get(index - 1) {
                    Some(image) => {
                        chat.remove_image(image);
                        print_info(&format!("Removed image #{index}."));
                    }
                    None => print_error(&format!("No image #{index}.")),
                }
            }
            Command::Summarize(text) => {
                let summarizer = session.summarizer();
                summarizer.summarize(&text);
                wait_for_summary(summarizer, &progress_style).await;
            }
            Command::Help => println!("{USAGE}"),
            Command::Quit => break,
        }
    }
}

fn print_prompt(session: &Session) {
    let chat = session.chat();
    let images = chat.snapshot().draft().images().len();
    let model = chat.active_model();
    if images > 0 {
        print!("{} > ", format!("[{model} +{images}]").dimmed());
    } else {
        print!("{} > ", format!("[{model}]").dimmed());
    }
    std::io::stdout().flush().ok();
}

fn print_info(message: &str) {
    println!("{}{}", BAR_CHAR.bright_black(), message.dimmed());
}

fn print_error(message: &str) {
    println!("{}{}", BAR_CHAR.bright_red(), message.red());
}

fn print_delta(delta: &str, streaming: &mut bool) {
    if !*streaming {
        print!("{}🤖 ", BAR_CHAR.bright_cyan());
        *streaming = true;
    }
    print!("{}", delta.bright_white());
    std::io::stdout().flush().ok();
}

fn new_spinner(style: &ProgressStyle) -> ProgressBar {
    let progress_bar = ProgressBar::new_spinner();
    progress_bar.set_style(style.clone());
    progress_bar.set_message("🤔 Thinking...");
    progress_bar
}

async fn wait_for_reply(
    chat: &Chat,
    delta_rx: &mut mpsc::UnboundedReceiver<String>,
    style: &ProgressStyle,
) {
    let mut snapshot_rx = chat.subscribe();
    let mut progress_bar = Some(new_spinner(style));
    let mut streaming = false;

    while snapshot_rx.borrow_and_update().is_awaiting_response() {
        if let Some(progress_bar) = &progress_bar {
            progress_bar.inc(1);
        }

        let tick = sleep(Duration::from_millis(100));
        select! {
            delta = delta_rx.recv() => {
                let Some(delta) = delta else {
                    break;
                };
                // Finish the progress bar before printing anything else.
                if let Some(progress_bar) = progress_bar.take() {
                    progress_bar.finish_and_clear();
                }
                print_delta(&delta, &mut streaming);
            }
            changed = snapshot_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tick => {}
        }
    }
    if let Some(progress_bar) = progress_bar.take() {
        progress_bar.finish_and_clear();
    }

    // Text that arrived together with the end of the response.
    while let Ok(delta) = delta_rx.try_recv() {
        print_delta(&delta, &mut streaming);
    }
    if streaming {
        println!();
    }

    match chat.snapshot().transcript().last() {
        Some(DataState::Success(turn)) if !streaming => {
            println!(
                "{}🤖 {}",
                BAR_CHAR.bright_cyan(),
                turn.text().bright_white()
            );
        }
        Some(DataState::Error(err)) => print_error(err.message()),
        _ => {}
    }
}

async fn wait_for_summary(summarizer: &Summarizer, style: &ProgressStyle) {
    let mut state_rx = summarizer.subscribe();
    let progress_bar = new_spinner(style);

    while !state_rx.borrow_and_update().is_finalized() {
        progress_bar.inc(1);

        let tick = sleep(Duration::from_millis(100));
        select! {
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tick => {}
        }
    }
    progress_bar.finish_and_clear();

    summarizer
        .state()
        .on_success(|summary| {
            let bar = BAR_CHAR.bright_green();
            println!("{bar}📝 {}", summary.bright_white());
        })
        .on_error(|err| print_error(err.message()));
}

async fn read_line(stdin: &mut BufReader<Stdin>) -> Option<String> {
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
