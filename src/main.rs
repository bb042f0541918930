//! Xiangqi Engine CLI
//!
//! 命令行界面，用于测试搜索引擎
//!
//! 支持两种模式：
//! 1. 单次命令模式：每次执行一个命令
//! 2. Server 模式：长驻进程，通过 stdin/stdout 通信

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, Write};
use std::time::Duration;
use xiangqi_engine::{Board, Color, Difficulty, Engine, Evaluator, SearchLimits};

#[derive(Parser)]
#[command(name = "xiangqi-engine")]
#[command(about = "Xiangqi Alpha-Beta Search Engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 获取合法走法
    Moves {
        /// FEN 字符串
        #[arg(long)]
        fen: String,
    },

    /// 搜索最佳走法
    Best {
        /// FEN 字符串
        #[arg(long)]
        fen: String,

        /// 难度 (novice, beginner, intermediate, advanced, master)
        #[arg(long, default_value = "intermediate")]
        difficulty: String,

        /// 搜索深度（覆盖难度的默认深度）
        #[arg(long)]
        depth: Option<u32>,

        /// 时间限制（秒，覆盖难度的默认限制）
        #[arg(long)]
        time_limit: Option<f64>,

        /// 置换表大小 (MB)
        #[arg(long, default_value = "64")]
        hash: usize,

        /// NNUE 权重文件（缺省用内置权重）
        #[arg(long)]
        weights: Option<std::path::PathBuf>,

        /// JSON 输出
        #[arg(long)]
        json: bool,
    },

    /// 评估局面分数
    Eval {
        /// FEN 字符串
        #[arg(long)]
        fen: String,

        /// JSON 输出
        #[arg(long)]
        json: bool,
    },

    /// 启动 server 模式（stdin/stdout 通信）
    Server {
        /// 置换表大小 (MB)
        #[arg(long, default_value = "128")]
        hash: usize,
    },
}

// Server 模式的请求和响应结构
#[derive(Serialize, Deserialize)]
struct ServerRequest {
    cmd: String,
    #[serde(default)]
    fen: String,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default)]
    depth: Option<u32>,
    #[serde(default)]
    time_limit: Option<f64>,
}

#[derive(Serialize, Deserialize, Default)]
struct ServerResponse {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "move")]
    mv: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    legal_moves: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    depth: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nodes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    elapsed_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    eval: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ServerResponse {
    fn success_best(mv: Option<String>, score: i32, depth: u32, nodes: u64, elapsed_ms: f64) -> Self {
        Self {
            ok: true,
            mv,
            score: Some(score),
            depth: Some(depth),
            nodes: Some(nodes),
            nps: Some(calc_nps(nodes, elapsed_ms / 1000.0)),
            elapsed_ms: Some(elapsed_ms),
            ..Default::default()
        }
    }

    fn success_legal_moves(legal_moves: Vec<String>) -> Self {
        Self {
            ok: true,
            legal_moves: Some(legal_moves),
            ..Default::default()
        }
    }

    fn success_eval(eval: i32, color: Color) -> Self {
        Self {
            ok: true,
            eval: Some(eval),
            color: Some(color_to_str(color).to_string()),
            ..Default::default()
        }
    }

    fn error(msg: &str) -> Self {
        Self {
            ok: false,
            error: Some(msg.to_string()),
            ..Default::default()
        }
    }
}

fn color_to_str(color: Color) -> &'static str {
    if color == Color::Red {
        "red"
    } else {
        "black"
    }
}

fn calc_nps(nodes: u64, elapsed_secs: f64) -> f64 {
    if elapsed_secs > 0.0 {
        nodes as f64 / elapsed_secs
    } else {
        0.0
    }
}

/// 按参数组合出搜索限制：难度给默认值，显式参数覆盖
fn build_limits(
    difficulty: &str,
    depth: Option<u32>,
    time_limit: Option<f64>,
) -> Result<SearchLimits, String> {
    let config = Difficulty::from_name(difficulty)?;
    let mut limits = SearchLimits::depth(depth.unwrap_or(config.depth));
    limits.time_limit = Some(
        time_limit
            .map(Duration::from_secs_f64)
            .unwrap_or(config.time_limit),
    );
    Ok(limits)
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Moves { fen } => match Board::from_fen(&fen) {
            Ok(board) => {
                let moves = board.legal_moves(board.current_turn());
                println!("Legal moves ({}):", moves.len());
                for mv in &moves {
                    println!("  {}", mv);
                }
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },

        Commands::Best {
            fen,
            difficulty,
            depth,
            time_limit,
            hash,
            weights,
            json,
        } => {
            let mut board = match Board::from_fen(&fen) {
                Ok(b) => b,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };
            let limits = match build_limits(&difficulty, depth, time_limit) {
                Ok(l) => l,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };

            let mut engine = match weights {
                Some(path) => Engine::with_evaluator(hash, Evaluator::from_weights_file(&path)),
                None => Engine::new(hash),
            };

            let outcome = engine.search(&mut board, &limits);
            let elapsed = outcome.stats.elapsed.as_secs_f64();
            let nps = calc_nps(outcome.stats.nodes, elapsed);

            if json {
                let response = ServerResponse::success_best(
                    outcome.best_move.map(|m| m.to_string()),
                    outcome.score,
                    outcome.depth,
                    outcome.stats.nodes,
                    elapsed * 1000.0,
                );
                println!("{}", serde_json::to_string_pretty(&response).unwrap());
            } else {
                match outcome.best_move {
                    Some(mv) => println!("Best move: {} (score: {})", mv, outcome.score),
                    None => println!("No legal moves"),
                }
                println!(
                    "\nStats: depth={}, nodes={}, qnodes={}, time={:.3}s, nps={:.0}",
                    outcome.depth, outcome.stats.nodes, outcome.stats.qnodes, elapsed, nps
                );
            }
        }

        Commands::Eval { fen, json } => match Board::from_fen(&fen) {
            Ok(board) => {
                let color = board.current_turn();
                let evaluator = Evaluator::new();
                let score = evaluator.evaluate(&board, color);

                if json {
                    let response = ServerResponse::success_eval(score, color);
                    println!("{}", serde_json::to_string_pretty(&response).unwrap());
                } else {
                    let color_cn = if color == Color::Red { "红方" } else { "黑方" };
                    println!("局面评估 ({} 视角): {}", color_cn, score);
                }
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },

        Commands::Server { hash } => {
            run_server(hash);
        }
    }
}

/// Server 模式主循环
/// 从 stdin 读取 JSON 请求，返回 JSON 响应到 stdout
fn run_server(hash: usize) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    // 引擎长驻：置换表和历史启发跨请求复用
    let mut engine = Engine::new(hash);
    let evaluator = Evaluator::new();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };

        if line.trim().is_empty() {
            continue;
        }

        let request: ServerRequest = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => {
                let response = ServerResponse::error(&format!("Invalid JSON: {}", e));
                println!("{}", serde_json::to_string(&response).unwrap());
                let _ = stdout.flush();
                continue;
            }
        };

        let response = match request.cmd.as_str() {
            "best" => handle_best_request(&mut engine, &request),
            "moves" => handle_moves_request(&request),
            "eval" => handle_eval_request(&evaluator, &request),
            "clear" => {
                engine.clear();
                ServerResponse {
                    ok: true,
                    ..Default::default()
                }
            }
            "quit" => break,
            _ => ServerResponse::error(&format!("Unknown command: {}", request.cmd)),
        };

        println!("{}", serde_json::to_string(&response).unwrap());
        let _ = stdout.flush();
    }
}

/// 处理 best 命令
fn handle_best_request(engine: &mut Engine, request: &ServerRequest) -> ServerResponse {
    let mut board = match Board::from_fen(&request.fen) {
        Ok(b) => b,
        Err(e) => return ServerResponse::error(&format!("Invalid FEN: {}", e)),
    };

    let difficulty = request.difficulty.as_deref().unwrap_or("intermediate");
    let limits = match build_limits(difficulty, request.depth, request.time_limit) {
        Ok(l) => l,
        Err(e) => return ServerResponse::error(&e),
    };

    let outcome = engine.search(&mut board, &limits);
    ServerResponse::success_best(
        outcome.best_move.map(|m| m.to_string()),
        outcome.score,
        outcome.depth,
        outcome.stats.nodes,
        outcome.stats.elapsed.as_secs_f64() * 1000.0,
    )
}

/// 处理 moves 命令
fn handle_moves_request(request: &ServerRequest) -> ServerResponse {
    match Board::from_fen(&request.fen) {
        Ok(board) => {
            let moves = board
                .legal_moves(board.current_turn())
                .iter()
                .map(|m| m.to_string())
                .collect();
            ServerResponse::success_legal_moves(moves)
        }
        Err(e) => ServerResponse::error(&format!("Invalid FEN: {}", e)),
    }
}

/// 处理 eval 命令（静态评估）
fn handle_eval_request(evaluator: &Evaluator, request: &ServerRequest) -> ServerResponse {
    match Board::from_fen(&request.fen) {
        Ok(board) => {
            let color = board.current_turn();
            ServerResponse::success_eval(evaluator.evaluate(&board, color), color)
        }
        Err(e) => ServerResponse::error(&format!("Invalid FEN: {}", e)),
    }
}
