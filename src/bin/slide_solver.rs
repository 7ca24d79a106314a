use clap::error::ErrorKind;
use clap::Parser;
use env_logger::{Env, Target};
use slide_solver::context::{SearchContext, SearchError, SearchMode};
use slide_solver::engine::Board;
use slide_solver::layout::reference_board;
use slide_solver::scanner::{path_boards, scan, ScanScope};
use slide_solver::solver::solve_iterative;
use thousands::Separable;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Keep scanning after the first solution and print every one reached
    #[clap(long, conflicts_with = "tree")]
    all: bool,

    /// Use iterative-deepening depth-first search instead of the full scan
    #[clap(long)]
    tree: bool,
}

fn print_usage() {
    let prog = std::env::args()
        .next()
        .unwrap_or_else(|| "slide_solver".to_string());
    println!("usage: {} [--all|--tree]", prog);
}

fn print_path(boards: &[Board]) {
    for (i, board) in boards.iter().enumerate() {
        println!("Step {}:\n{}\n", i, board);
    }
}

fn run_tree(start: &Board) -> Result<(), SearchError> {
    let mut ctx = SearchContext::new(SearchMode::DepthFirst, start);
    match solve_iterative(&mut ctx, start, u8::MAX)? {
        Some(solution) => {
            println!("Solution found at depth {}:\n", solution.depth);
            print_path(&solution.boards(start));
            println!(
                "{} moves, {} moves tried, {} positions expanded",
                solution.len(),
                solution.stats.tries.separate_with_commas(),
                solution.stats.expansions.separate_with_commas()
            );
        }
        None => println!("No solution found up to depth {}.", u8::MAX),
    }
    Ok(())
}

fn run_scan(start: &Board, scope: ScanScope) -> Result<(), SearchError> {
    let mut ctx = SearchContext::new(SearchMode::Scan, start);
    let report = scan(&mut ctx, start, scope)?;
    println!(
        "{} legal positions, {} final, {} reached from the start\n",
        report.classification.legal.separate_with_commas(),
        report.classification.finals.separate_with_commas(),
        report.reached.separate_with_commas()
    );

    for (n, &code) in report.found.iter().enumerate() {
        let boards = path_boards(&ctx, code)?;
        println!(
            "Solution {} (position {}, {} moves):\n",
            n + 1,
            code,
            boards.len().saturating_sub(1)
        );
        print_path(&boards);
    }
    if report.found.is_empty() {
        println!("No solution reachable.");
    } else {
        println!("{} solution(s) found.", report.found.len());
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Stdout)
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return;
        }
        Err(_) => {
            print_usage();
            return;
        }
    };

    let start = reference_board();
    println!("Initial board state:\n{}\n", start);

    let outcome = if args.tree {
        run_tree(&start)
    } else if args.all {
        run_scan(&start, ScanScope::AllSolutions)
    } else {
        run_scan(&start, ScanScope::FirstSolution)
    };
    if let Err(e) = outcome {
        println!("error: {}", e);
    }
}
