use adl_optimizer::expr::CoreExpression;
use adl_optimizer::optimizer::Optimizer;
use adl_optimizer::tree::EncodedExpressionTree;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Debug,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let home = CoreExpression::equals("country", "DE");
    let premium = CoreExpression::equals("tier", "premium");
    let trial = CoreExpression::equals("tier", "trial");

    // (country = DE AND tier = premium) OR (country = DE AND tier = trial)
    let e = (home.clone() & premium) | (home.clone() & trial);
    println!("e = {}", e);

    let mut tree = EncodedExpressionTree::from_expression(&e)?;
    println!("tree = {:?}", tree.codec().dictionary());
    print!("{}", tree.debug_string()?);

    Optimizer::default().process(&mut tree)?;
    print!("{}", tree.debug_string()?);
    println!("optimized = {}", tree.to_core_expression()?);

    // country = DE OR STRICT NOT country = DE
    let e = home.clone() | home.strict_not();
    println!("e = {}", e);
    println!("optimized = {}", Optimizer::default().process_expression(&e)?);

    Ok(())
}
