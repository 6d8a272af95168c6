use anyhow::Context;
use automata::closure::state_set_label;
use automata::{
    nfa_to_dfa, pattern_to_nfa, Graph, Halt, Machine, MachineKind, MachineLibrary, MachineLoader,
    Simulation, SimulationOptions, Step, DEFAULT_STEP_BUDGET,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, Level};

#[derive(Parser)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run inputs against a machine file or a bundled machine
    Run {
        /// Path to a machine JSON file
        #[clap(short, long, conflicts_with = "machine")]
        file: Option<PathBuf>,

        /// Name of a bundled machine, see `list`
        #[clap(short, long)]
        machine: Option<String>,

        /// Inputs to run, one verdict per input
        #[clap(short, long)]
        input: Vec<String>,

        /// Step budget for pushdown and Turing machines
        #[clap(short, long, default_value_t = DEFAULT_STEP_BUDGET)]
        budget: usize,

        /// Print each step of the execution
        #[clap(short = 'd', long)]
        trace: bool,
    },
    /// Convert an NFA machine file into an equivalent DFA
    Determinize {
        file: PathBuf,

        /// Write the result here instead of stdout
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
    /// Build an NFA from a regular expression
    Pattern {
        pattern: String,

        /// Determinize the result
        #[clap(long)]
        dfa: bool,

        /// Test these inputs instead of printing the machine
        #[clap(short, long)]
        input: Vec<String>,
    },
    /// List the bundled machines
    List,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Run {
            file,
            machine,
            input,
            budget,
            trace,
        } => {
            let machine = match (file, machine) {
                (Some(path), _) => MachineLoader::load_machine(&path)?,
                (None, Some(name)) => MachineLibrary::by_name(&name)?,
                (None, None) => anyhow::bail!("either --file or --machine is required"),
            };
            let options = SimulationOptions {
                step_budget: budget,
            };
            info!(name = %machine.name, kind = %machine.kind, "running machine");

            for input in &input {
                let verdict = if trace {
                    trace_run(&machine.graph, machine.kind, input, &options)
                } else {
                    Simulation::new(&machine.graph, machine.kind, input, &options).run()
                };
                print_verdict(input, &verdict);
            }
        }
        Command::Determinize { file, output } => {
            let machine = MachineLoader::load_machine(&file)?;
            if machine.kind != MachineKind::Nfa {
                anyhow::bail!("{} is a {} machine, expected NFA", machine.name, machine.kind);
            }

            let dfa = Machine {
                name: format!("{} (DFA)", machine.name),
                kind: MachineKind::Nfa,
                description: machine.description,
                graph: nfa_to_dfa(&machine.graph),
            };
            write_machine(&dfa, output.as_deref())?;
        }
        Command::Pattern {
            pattern,
            dfa,
            input,
        } => {
            let mut graph = pattern_to_nfa(&pattern)?;
            if dfa {
                graph = nfa_to_dfa(&graph);
            }

            if input.is_empty() {
                let machine = Machine {
                    name: pattern,
                    kind: MachineKind::Nfa,
                    description: String::new(),
                    graph,
                };
                write_machine(&machine, None)?;
            } else {
                let options = SimulationOptions::default();
                for input in &input {
                    let verdict = Simulation::new(&graph, MachineKind::Nfa, input, &options).run();
                    print_verdict(input, &verdict);
                }
            }
        }
        Command::List => {
            for index in 0..MachineLibrary::count() {
                let info = MachineLibrary::info(index)?;
                println!(
                    "{:>2}  {:<14} {:<9} {} states, {} transitions",
                    info.index, info.name, info.kind, info.state_count, info.transition_count
                );
                if !info.description.is_empty() {
                    println!("    {}", info.description);
                }
            }
        }
    }

    Ok(())
}

/// Steps the simulation by hand, printing the machine after every step.
fn trace_run(graph: &Graph, kind: MachineKind, input: &str, options: &SimulationOptions) -> Halt {
    let mut simulation = Simulation::new(graph, kind, input, options);
    let mut step = 0;

    print_state(step, &simulation);
    loop {
        match simulation.step() {
            Step::Continue => {
                step += 1;
                print_state(step, &simulation);
            }
            Step::Halt(halt) => return halt,
        }
    }
}

fn print_state(step: usize, simulation: &Simulation) {
    match simulation {
        Simulation::Nfa(runner) => println!(
            "Step: {}, Position: {}, States: {}",
            step,
            runner.position(),
            state_set_label(runner.states())
        ),
        Simulation::Pushdown(runner) => {
            let pending: Vec<String> = runner
                .pending()
                .map(|config| {
                    format!(
                        "{}[{}|{}]",
                        config.vertex,
                        config.stack.iter().collect::<String>(),
                        config.remaining_input()
                    )
                })
                .collect();
            println!("Step: {}, Pending: {}", step, pending.join(" "));
        }
        Simulation::Turing(machine) => println!(
            "Step: {}, State: {}, Head: {}, Tape: {}",
            step,
            machine.state(),
            machine.head(),
            machine.tape_contents()
        ),
    }
}

fn print_verdict(input: &str, verdict: &Halt) {
    match verdict {
        Halt::Accept => println!("{input:?}: accept"),
        Halt::Reject(reason) => println!("{input:?}: reject ({reason})"),
    }
}

fn write_machine(machine: &Machine, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => MachineLoader::save_machine(machine, path)
            .with_context(|| format!("writing {}", path.display())),
        None => {
            println!("{}", serde_json::to_string_pretty(machine)?);
            Ok(())
        }
    }
}
