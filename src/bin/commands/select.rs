//! Interactive country selection

use anyhow::{anyhow, Result};
use countryasn::lens::country::{CountryCode, CountryEntry, CountryLens};
use std::io::{BufRead, Write};

enum Method {
    Code,
    Name,
}

/// Prompt until a valid country is chosen
///
/// Codes are checked against the country table before anything else
/// happens; invalid input is reported and asked for again.
pub fn select_country<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<CountryCode> {
    let method = loop {
        let answer = ask(
            input,
            output,
            "Select the country by [1] country code or [2] country name: ",
        )?;
        match answer.to_lowercase().as_str() {
            "1" | "code" | "c" => break Method::Code,
            "2" | "name" | "n" => break Method::Name,
            _ => writeln!(output, "Please answer 1 or 2.")?,
        }
    };

    match method {
        Method::Code => select_by_code(input, output),
        Method::Name => select_by_name(input, output),
    }
}

fn select_by_code<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<CountryCode> {
    loop {
        let answer = ask(input, output, "Country code (e.g. NL): ")?;
        match CountryCode::new(&answer) {
            Ok(code) => return Ok(code),
            Err(e) => writeln!(output, "{}", e)?,
        }
    }
}

fn select_by_name<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<CountryCode> {
    let lens = CountryLens::new();
    loop {
        let answer = ask(input, output, "Country name (or part of it): ")?;
        let matches = lens.lookup(&answer);
        match matches.len() {
            0 => writeln!(output, "No country matches '{}'.", answer)?,
            1 => return Ok(CountryCode::new(&matches[0].code)?),
            _ => return choose(input, output, &matches),
        }
    }
}

fn choose<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    matches: &[CountryEntry],
) -> Result<CountryCode> {
    for (i, entry) in matches.iter().enumerate() {
        writeln!(output, "  [{}] {} ({})", i + 1, entry.name, entry.code)?;
    }
    loop {
        let answer = ask(input, output, "Choose a number: ")?;
        let picked = answer
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| matches.get(i));
        match picked {
            Some(entry) => return Ok(CountryCode::new(&entry.code)?),
            None => writeln!(output, "Please enter a number between 1 and {}.", matches.len())?,
        }
    }
}

fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, prompt: &str) -> Result<String> {
    write!(output, "{}", prompt)?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(anyhow!("no country selected"));
    }
    Ok(line.trim().to_string())
}
