use anyhow::Result;
use rustllm::{ConfigOverrides, LLMAgent};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// 演示入口：rustllm [provider] [--config <path>]
///
/// 按行读 stdin 做问答，支持 :system / :clear / :history / :quit 命令。
#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .filter_module("rustllm", log::LevelFilter::Info)
        .init();

    let mut provider = "deepseek".to_string();
    let mut config_path: Option<PathBuf> = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            config_path = args.next().map(PathBuf::from);
        } else {
            provider = arg;
        }
    }

    let mut agent = LLMAgent::new(&provider, config_path.as_deref(), ConfigOverrides::default())?;
    println!(
        "已就绪: {} (默认模型: {})",
        agent.config().provider.as_str(),
        agent.config().default_model
    );
    println!("命令: :system <提示> | :clear | :history | :quit");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let line = match lines.next() {
            Some(l) => l?,
            None => break,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(prompt) = line.strip_prefix(":system ") {
            agent.set_system_prompt(prompt);
            println!("已设置 system 提示");
        } else if line == ":clear" {
            agent.clear_history();
            println!("历史已清空");
        } else if line == ":history" {
            for m in agent.get_history() {
                println!("[{}] {}", m.role.as_str(), m.content);
            }
        } else if line == ":quit" {
            break;
        } else {
            match agent.ask(line).await {
                Ok(answer) => println!("{answer}"),
                Err(e) => eprintln!("错误: {e}"),
            }
        }
    }

    Ok(())
}
