use countryasn::lens::country::{CountryLens, CountryOutputFormat};

/// Print the country table
pub fn run(format: CountryOutputFormat) {
    let lens = CountryLens::new();
    println!("{}", lens.format_results(&lens.all(), &format));
}
