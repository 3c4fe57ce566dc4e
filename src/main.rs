use base64::{prelude::*, write::EncoderWriter};
use clap::Parser;
use scrypt_ctr::{
    AesCtr, Counter, Params,
    ctr::DEFAULT_INITIAL_VALUE,
    self_test::{
        Case, CastAes128Ctr, CastN2R1P1, CastN16R1P1, CastN32R4P15, CastN1024R1P2, CastN1024R8P16,
        CastN16384R8P1, CastN1048576R8P1, CtrCase,
    },
};

use std::{
    io::{Read, Write},
    num::NonZeroUsize,
    process::ExitCode,
};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(clap::Subcommand)]
enum Command {
    /// Run the known-answer self tests
    Cast {
        #[arg(short, long, help = "skip the large-memory cases")]
        fast: bool,
    },
    /// Derive a key; whichever of key or salt is missing is read from stdin
    Compute {
        #[arg(short, long)]
        key: Option<String>,
        #[arg(short, long)]
        salt: Option<String>,
        #[arg(short, long, default_value = "16384", help = "N value")]
        n: u64,
        #[arg(short, long, default_value = "8")]
        r: u32,
        #[arg(short, long, default_value = "1")]
        p: u32,
        #[arg(short, long, default_value = "64")]
        output_len: usize,
        #[arg(long = "raw", conflicts_with = "output_hex")]
        output_raw: bool,
        #[arg(long = "hex")]
        output_hex: bool,
        #[arg(short, long, default_value = "1", help = "worker threads for the p lanes")]
        threads: NonZeroUsize,
    },
    /// AES-CTR transform stdin to stdout (encryption and decryption are the same operation)
    Ctr {
        #[arg(short, long, help = "AES key in hex (16, 24 or 32 bytes)")]
        key: String,
        #[arg(short, long, default_value_t = DEFAULT_INITIAL_VALUE, help = "initial 128-bit counter value")]
        counter: u128,
    },
}

#[derive(Parser)]
#[command(version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

fn slurp_stdin() -> std::io::Result<Box<[u8]>> {
    let mut stdin = std::io::stdin().lock();
    let mut buffer = Vec::new();
    stdin.read_to_end(&mut buffer)?;
    Ok(buffer.into_boxed_slice())
}

fn cast(fast: bool) -> CliResult<()> {
    let mut stdout = std::io::stdout().lock();

    writeln!(
        stdout,
        "Kernel: {} (selected: {})",
        scrypt_ctr::KERNEL,
        scrypt_ctr::romix::selected_kernel()
    )?;

    macro_rules! case {
        ($name:literal, $c:block) => {{
            write!(stdout, "Testing: {} ... ", $name)?;
            stdout.flush()?;
            let start = std::time::Instant::now();
            $c
            let elapsed = start.elapsed();
            writeln!(stdout, "PASS ({} ms)", elapsed.as_millis())?;
        }};
    }

    case!("2/1/1", { CastN2R1P1::algorithm_self_test() });
    case!("16/1/1", { CastN16R1P1::algorithm_self_test() });
    case!("32/4/15", { CastN32R4P15::algorithm_self_test() });
    case!("32/4/15 (parallel)", { CastN32R4P15::parallel_self_test() });
    case!("1024/1/2", { CastN1024R1P2::algorithm_self_test() });
    case!("1024/8/16", { CastN1024R8P16::algorithm_self_test() });
    case!("1024/8/16 (parallel)", { CastN1024R8P16::parallel_self_test() });
    case!("AES-128-CTR", { CastAes128Ctr::algorithm_self_test() });

    if !fast {
        case!("16384/8/1", { CastN16384R8P1::algorithm_self_test() });
        case!("1048576/8/1", { CastN1048576R8P1::algorithm_self_test() });
    }

    writeln!(stdout, "------ PASSED ALL TESTS ------")?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn compute(
    key: Option<String>,
    salt: Option<String>,
    n: u64,
    r: u32,
    p: u32,
    output_len: usize,
    output_raw: bool,
    output_hex: bool,
    threads: NonZeroUsize,
) -> CliResult<()> {
    if key.is_none() && salt.is_none() {
        return Err("at least one of key or salt is required".into());
    }

    let params = Params::new(n, r, p)?;
    Params::check_output_len(output_len)?;

    let mut key = key.map(|s| s.into_bytes().into_boxed_slice());
    let mut salt = salt.map(|s| s.into_bytes().into_boxed_slice());

    if key.is_none() || salt.is_none() {
        let data = slurp_stdin()?;

        if key.is_some() {
            salt = Some(data);
        } else {
            key = Some(data);
        }
    }

    let (Some(key), Some(salt)) = (key, salt) else {
        return Err("missing key or salt".into());
    };

    let mut output = vec![0; output_len].into_boxed_slice();
    if threads.get() > 1 {
        scrypt_ctr::scrypt_parallel(&key, &salt, &params, threads, &mut output)?;
    } else {
        scrypt_ctr::scrypt(&key, &salt, &params, &mut output)?;
    }

    let mut stdout = std::io::stdout();
    if output_raw {
        stdout.write_all(&output)?;
    } else if output_hex {
        writeln!(stdout, "{}", hex::encode(&output))?;
    } else {
        let encoder = BASE64_STANDARD;
        let mut write = EncoderWriter::new(&mut stdout, &encoder);
        write.write_all(&output)?;
        write.finish()?.write_all(b"\n")?;
    }
    stdout.flush()?;
    Ok(())
}

fn ctr(key: &str, counter: u128) -> CliResult<()> {
    let key = hex::decode(key)?;
    let mut cipher = AesCtr::new(&key, Counter::new(128, counter)?)?;

    let mut stdin = std::io::stdin().lock();
    let mut stdout = std::io::stdout().lock();
    let mut buf = vec![0u8; 64 * 1024];

    loop {
        let n = match stdin.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        cipher.apply_keystream(&mut buf[..n]);
        stdout.write_all(&buf[..n])?;
    }

    stdout.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();

    let result = match args.command {
        Command::Cast { fast } => cast(fast),
        Command::Compute {
            key,
            salt,
            n,
            r,
            p,
            output_len,
            output_raw,
            output_hex,
            threads,
        } => compute(key, salt, n, r, p, output_len, output_raw, output_hex, threads),
        Command::Ctr { key, counter } => ctr(&key, counter),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
