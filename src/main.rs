use std::{
    env,
    fs::{self, create_dir, read_to_string},
    path::PathBuf,
    process,
    rc::Rc,
    time::Instant,
};

use transpiler::{
    ast::ast::parse_program,
    backend::backend::Target,
    compiler::{
        compiler::{transpile_with, CompilerConfig},
        imports::DirectoryResolver,
    },
    errors::errors::Error,
    format_error,
};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} <program.json> [target]", args[0]);
        process::exit(2);
    }

    if let Err(error) = run(&args[1], args.get(2).map(String::as_str)) {
        eprintln!("{}", format_error(&error));
        process::exit(1);
    }
}

fn run(file_path: &str, target: Option<&str>) -> Result<(), Error> {
    let start = Instant::now();

    let target: Target = target.unwrap_or("python").parse()?;
    let config = CompilerConfig {
        target,
        standard_libs: env::var_os("W_STANDARD_LIBS")
            .map(PathBuf::from)
            .unwrap_or_default(),
        ..CompilerConfig::default()
    };

    let file_contents = read_to_string(file_path).unwrap_or_else(|error| {
        eprintln!("Failed to read {}: {}", file_path, error);
        process::exit(1);
    });
    let program = parse_program(&file_contents)?;

    println!("Loaded in {:?}", start.elapsed());

    let root = PathBuf::from(file_path)
        .parent()
        .map(PathBuf::from)
        .unwrap_or_default();
    let resolver = Rc::new(DirectoryResolver::new(root, &config));

    let compile_start = Instant::now();
    let output = transpile_with(&program, config, resolver)?;

    println!("Transpiled in {:?}", compile_start.elapsed());

    if !PathBuf::from("build").exists() {
        create_dir("build").unwrap_or_else(|error| {
            eprintln!("Failed to create build directory: {}", error);
            process::exit(1);
        });
    }

    let out_path = PathBuf::from(format!("build/out.{}", extension(target)));
    fs::write(&out_path, output.assemble(target.backend().as_ref())).unwrap_or_else(|error| {
        eprintln!("Failed to write {}: {}", out_path.display(), error);
        process::exit(1);
    });

    for link in &output.links {
        println!("Requires native library {}", link);
    }
    println!("Wrote {}", out_path.display());
    println!("Total time: {:?}", start.elapsed());
    Ok(())
}

fn extension(target: Target) -> &'static str {
    match target {
        Target::Python => "py",
    }
}
