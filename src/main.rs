use multilevel_decomp::{
    CoefficientTable, DecompResult, GeneratorSettings, OneHotEncoder, SampleGenerator,
    TableSettings,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

fn main() -> DecompResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut rng = StdRng::seed_from_u64(42);

    // Literal table: singular baseline plus one level with two contributors
    let table = CoefficientTable::from_levels(vec![
        vec![(0.0, 5.0)],
        vec![(1.0, 1.0), (-1.0, 1.0)],
    ])?;
    println!("Literal table:\n{}", table);

    let generator = SampleGenerator::new(GeneratorSettings::new(1000));
    let samples = generator.generate(&table, &mut rng)?;
    let summary = samples.summary();

    println!("Data shape        : {:?}", samples.data.dim());
    println!("Contributor shape : {:?}", samples.contributors.dim());
    println!(
        "Empirical mean    : {:.4} (se {:.4}, expected {:.4})",
        summary.mean(),
        summary.std_error(),
        table.expected_mean()
    );
    println!(
        "Empirical std     : {:.4} (expected {:.4})",
        summary.std(),
        table.expected_variance().sqrt()
    );
    println!("Level 1 counts    : {:?}", samples.selection_counts(1, 2));

    // Design matrix for an external fitter, baseline column dropped
    let encoder = OneHotEncoder::new(table.n_contributors(), false);
    let design = encoder.encode(samples.without_baseline().view())?;
    println!("Design columns    : {:?}", encoder.column_labels());
    println!("First rows        :\n{}", design.slice(ndarray::s![..3, ..]));

    // Sampled table, unaligned and aligned
    let settings = TableSettings::new(vec![1, 3, 4], 0.0, 0.0).with_align(false);
    let sampled = CoefficientTable::sample(&settings, &mut rng)?;
    println!("Sampled table:\n{}", sampled);
    println!("Aligned table:\n{}", sampled.aligned());

    let runs = generator.generate_runs(&sampled.aligned(), 5, 7)?;
    for (run, samples) in runs.iter().enumerate() {
        println!("Run {} mean: {:.4}", run, samples.summary().mean());
    }

    Ok(())
}
