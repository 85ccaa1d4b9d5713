use std::{env, fs, process::ExitCode, time::Instant};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("usage: mlirgen <input-path> [<output-path>]");
        return ExitCode::FAILURE;
    }
    let input_path = &args[1];
    let code = match read_file(input_path) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let start = Instant::now();
    let ir_text = match mlirgen::compile(&code, input_path) {
        Ok(text) => text,
        Err(err) => {
            let elapsed = start.elapsed();
            eprintln!("error after: {elapsed:?}\n{err}");
            return ExitCode::FAILURE;
        }
    };
    let elapsed = start.elapsed();
    eprintln!("lowered {input_path} in {elapsed:?}");

    match args.get(2) {
        Some(output_path) => {
            if let Err(err) = fs::write(output_path, ir_text) {
                eprintln!("error writing {output_path}: {err}");
                return ExitCode::FAILURE;
            }
        }
        None => print!("{ir_text}"),
    }
    ExitCode::SUCCESS
}

fn read_file(file_path: &str) -> Result<String, String> {
    eprintln!("Reading file: {file_path}");
    match fs::metadata(file_path) {
        Ok(metadata) => {
            if !metadata.is_file() {
                return Err(format!("Error: {file_path} is not a file"));
            }
        }
        Err(err) => {
            return Err(format!("Error reading {file_path}: {err}"));
        }
    }
    match fs::read_to_string(file_path) {
        Ok(contents) => Ok(contents),
        Err(err) => Err(format!("Error reading file: {err}")),
    }
}
