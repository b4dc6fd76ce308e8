use std::env;
use std::fs;
use std::sync::Arc;
use learnlines_rust::{parse, play_summary, Conf, PlayDatabase, PlayStore, RehearsalSession, SceneView};
use learnlines_rust::store::{BUNDLED_PLAY, BUNDLED_PLAY_NAME};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

struct Args {
    play_file: String,
    character: Option<String>,
    store: Option<String>,
    config: Option<String>,
}

fn parse_args(args: &[String]) -> Option<Args> {
    let mut rest = args.iter().skip(1);
    let mut parsed = Args { play_file: String::new(), character: None, store: None, config: None };
    let mut positional = Vec::new();
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--store" => parsed.store = Some(rest.next()?.clone()),
            "--config" => parsed.config = Some(rest.next()?.clone()),
            _ => positional.push(arg.clone()),
        }
    }
    let mut positional = positional.into_iter();
    parsed.play_file = positional.next()?;
    parsed.character = positional.next();
    Some(parsed)
}

fn print_lines(view: &SceneView<'_>, from: usize) {
    if from == 0 {
        println!("\n== {} ==", view.title());
    }
    for line in view.lines.iter().skip(from) {
        println!("{}: {}", line.character, line.text);
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();
    let Some(args) = parse_args(&args) else {
        println!("Usage: learnlines <play_file> [character] [--store <file.json>] [--config <conf.json>]");
        return;
    };

    let config = match &args.config {
        Some(path) => match fs::read_to_string(path).map(|json| Conf::from_json_str(&json)) {
            Ok(Ok(conf)) => conf,
            Ok(Err(e)) => {
                println!("配置文件格式错误: {}", e);
                return;
            }
            Err(e) => {
                println!("读取配置文件失败: {}", e);
                return;
            }
        },
        None => Conf::default(),
    };

    let content = match fs::read_to_string(&args.play_file) {
        Ok(content) => content,
        Err(e) => {
            println!("读取文件失败: {}", e);
            return;
        }
    };

    let play = match parse(&content, &config) {
        Ok(play) => play,
        Err(e) => {
            println!("解析失败: {}", e);
            return;
        }
    };

    let Some(character) = args.character else {
        let summary = play_summary(&play);
        println!("剧名: {}", summary.name);
        for act in &summary.acts {
            println!("{} ({} 场)", act.name, act.scenes.len());
        }
        println!("角色:");
        for character in &summary.characters {
            println!("  {} - {} 句台词, {} 场", character.name, character.lines, character.scenes);
        }
        return;
    };

    let database = match &args.store {
        Some(path) => match PlayDatabase::open_seeded(path, &[(BUNDLED_PLAY_NAME, BUNDLED_PLAY)]).await {
            Ok(db) => Arc::new(db),
            Err(e) => {
                println!("打开存储失败: {}", e);
                return;
            }
        },
        None => Arc::new(PlayDatabase::in_memory()),
    };

    let mut session = RehearsalSession::new(database.clone(), database.clone(), config);
    // 存储中已有相同原文时直接载入，保留上次的进度
    let unchanged = matches!(database.get_play(&play.name).await, Ok(Some(stored)) if stored == content);
    let loaded = if unchanged {
        session.load_play(&play.name).await
    } else {
        session.insert_and_set_play(&play.name, &content).await
    };
    if let Err(e) = loaded {
        println!("载入剧本失败: {}", e);
        return;
    }

    if session.engine().me().map(|me| me.name.as_str()) != Some(character.as_str()) {
        session.select_character(Some(&character));
    }
    if session.engine().me().is_none() {
        println!("剧中没有角色: {}", character);
        return;
    }

    println!("回车: 下一句  n: 下一场  r: 本场重来  q: 退出");
    let mut shown = 0;
    if let Some(view) = session.engine().visible_lines() {
        print_lines(&view, 0);
        shown = view.lines.len();
    }

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(command)) = input.next_line().await {
        match command.trim() {
            "q" => break,
            "n" => {
                if !session.engine().has_next_act_scene() {
                    println!("(已是最后一场)");
                    continue;
                }
                session.next_act_scene();
                shown = 0;
            }
            "r" => {
                session.reset_act_scene();
                shown = 0;
            }
            _ => {
                if !session.engine().has_next_line() {
                    println!("(本场结束)");
                    continue;
                }
                session.next_line();
            }
        }
        if let Some(view) = session.engine().visible_lines() {
            print_lines(&view, shown);
            shown = view.lines.len();
        }
    }

    session.flush().await;
}
