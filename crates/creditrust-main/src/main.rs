use creditrust_lib::output::StdIO;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let mut io = StdIO::new();
    creditrust_cli::run(&args, &mut io)
}
