use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use dl_features::cache::DenotationCache;
use dl_features::factory::ElementFactory;
use dl_features::generator::{Generator, GeneratorConfig};
use dl_features::instance::InstanceInfo;
use dl_features::state::State;
use dl_features::vocabulary::VocabularyInfo;

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Largest feature complexity to generate.
    #[clap(long, value_name = "INT", default_value = "4")]
    max_complexity: usize,

    /// Time limit in seconds.
    #[clap(long, value_name = "SECONDS")]
    time_limit: Option<u64>,

    /// Element limit.
    #[clap(long, value_name = "INT")]
    max_elements: Option<usize>,

    /// Worker threads (0 = all cores).
    #[clap(long, value_name = "INT", default_value = "0")]
    threads: usize,

    /// Write the DAG of the hand-written features to this DOT file.
    #[clap(long, value_name = "FILE")]
    dot: Option<String>,
}

/// Two trucks, three packages and three locations, with four sampled states
/// of a delivery plan.
fn logistics() -> color_eyre::Result<(Arc<VocabularyInfo>, Vec<State>)> {
    let mut vocabulary = VocabularyInfo::new();
    vocabulary.add_predicate("at", 2)?;
    vocabulary.add_predicate("in", 2)?;
    vocabulary.add_predicate("truck", 1)?;
    vocabulary.add_predicate("location", 1)?;
    vocabulary.add_predicate("at_goal", 2)?;
    vocabulary.add_constant("depot")?;
    let vocabulary = Arc::new(vocabulary);

    let trucks = ["t1", "t2"];
    let packages = ["p1", "p2", "p3"];
    let locations = ["depot", "north", "south"];

    let mut instance = InstanceInfo::new(vocabulary.clone());
    for t in trucks {
        instance.add_static_atom("truck", &[t])?;
    }
    for l in locations {
        instance.add_static_atom("location", &[l])?;
    }
    for p in packages {
        instance.add_static_atom("at_goal", &[p, "depot"])?;
        for t in trucks {
            instance.add_atom("in", &[p, t])?;
        }
    }
    for x in trucks.into_iter().chain(packages) {
        for l in locations {
            instance.add_atom("at", &[x, l])?;
        }
    }
    let instance = Arc::new(instance);

    let plan = [
        vec!["at(t1,depot)", "at(t2,north)", "at(p1,north)", "at(p2,south)", "at(p3,south)"],
        vec!["at(t1,south)", "at(t2,north)", "in(p1,t2)", "at(p2,south)", "at(p3,south)"],
        vec!["at(t1,south)", "at(t2,depot)", "in(p1,t2)", "in(p2,t1)", "in(p3,t1)"],
        vec!["at(t1,depot)", "at(t2,depot)", "at(p1,depot)", "at(p2,depot)", "at(p3,depot)"],
    ];
    let mut states = Vec::new();
    for (i, atoms) in plan.iter().enumerate() {
        states.push(State::from_atom_names(instance.clone(), atoms.iter().copied(), i)?);
    }
    Ok((vocabulary, states))
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();
    println!("args = {:?}", args);

    let (vocabulary, states) = logistics()?;
    let factory = ElementFactory::new(vocabulary);
    let cache = DenotationCache::new();

    // Hand-written features: packages not yet delivered, and how far the
    // nearest truck is from a package.
    let undelivered = factory.parse_numerical(
        "n_count(c_diff(c_primitive(at_goal,0),c_some(r_primitive(at,0,1),c_one_of(depot))))",
    )?;
    let in_truck = factory.parse_boolean("b_empty(r_primitive(in,0,1))")?;
    let distance = factory.parse_numerical(
        "n_role_distance(r_primitive(at,0,1),r_compose(r_inverse(r_primitive(at,0,1)),r_primitive(at,0,1)),r_primitive(at_goal,0,1))",
    )?;
    println!("{} = {:?}", factory.repr(undelivered), cache.evaluate(&factory, undelivered, &states));
    println!("{} = {:?}", factory.repr(in_truck), cache.evaluate(&factory, in_truck, &states));
    println!("{} = {:?}", factory.repr(distance), cache.evaluate(&factory, distance, &states));

    if let Some(path) = &args.dot {
        let dot = factory.to_dot(&[undelivered.into(), in_truck.into(), distance.into()])?;
        std::fs::write(path, dot)?;
        println!("Wrote DOT to '{}'", path);
    }

    let config = GeneratorConfig {
        max_complexity: args.max_complexity,
        time_limit: args.time_limit.map(Duration::from_secs),
        max_elements: args.max_elements,
        num_threads: args.threads,
        ..GeneratorConfig::default()
    };
    let features = Generator::new(&factory, &cache, config).generate(&states);

    println!(
        "Generated {} concepts, {} roles, {} numericals, {} booleans ({:?})",
        features.concepts.len(),
        features.roles.len(),
        features.numericals.len(),
        features.booleans.len(),
        features.termination
    );
    for stats in features.iterations.iter() {
        println!(
            "  complexity {}: {} candidates, {} retained, {} pruned in {:?}",
            stats.complexity, stats.candidates, stats.retained, stats.pruned, stats.elapsed
        );
    }
    for repr in features.feature_reprs(&factory) {
        println!("{}", repr);
    }
    println!("factory = {:?}", factory);
    println!("cache: {}", cache.stats());

    let time_total = time_total.elapsed();
    println!("\nAll done in {:.3} s", time_total.as_secs_f64());

    Ok(())
}
