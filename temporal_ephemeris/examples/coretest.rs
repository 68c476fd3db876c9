/*  temporal_ephemeris-rs | Solar terms, lunations and the chinese lunisolar calendar.

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as
    published by the Free Software Foundation, either version 3 of the
    License, or (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use std::env;

use temporal_ephemeris::lunar::{months_from_solstice, solar_to_lunar};
use temporal_ephemeris::terms::{term_in_year, SolarTerm};

fn main() {
    let year: i32 = env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(2024);

    println!("Term\tlon\tinstant (UTC)");
    for term in SolarTerm::ALL {
        match term_in_year(year, term).and_then(|c| c.instant()) {
            Ok(instant) => println!("{}\t{}\t{}", term, term.longitude(), instant),
            Err(e) => eprintln!("{}: {}", term, e),
        }
    }

    println!();
    println!("Month\tfirst day\tdays");
    match months_from_solstice(year - 1) {
        Ok(months) => {
            for month in months {
                let leap = if month.is_leap { "*" } else { "" };
                println!("{}{}\t{}\t{}", month.month, leap, month.first_day, month.days);
                if let Ok(check) = solar_to_lunar(month.first_day) {
                    assert_eq!(check.day, 1);
                }
            }
        }
        Err(e) => eprintln!("{}", e),
    }
}
