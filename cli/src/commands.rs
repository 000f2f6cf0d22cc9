use almanac::{
    compute_four_pillars_for, view_for, AstronomicalCalendar, Calendar, FourPillarsResult,
    Granularity, LuckPillar, ManualPillars,
};
use anyhow::{Context, Result};
use chart::{
    group_advice_by_scenario, interpolate, key_levels, lowest_energy_below_support, price_bounds,
    Jitter, NoJitter, RngJitter,
};
use chrono::{Datelike, NaiveDate, Utc};
use chrono_tz::Asia::Shanghai;
use clap::{Args, Parser, Subcommand};
use common::transforms::numbers::format_score;
use common::{BirthRequest, Gender, LifeDestinyResult, SchemaVersion};
use log::info;
use oracle::{
    build_prompt_for_chart, build_prompt_for_manual, export_result, generate_destiny,
    import_result, prompt_hash, AnthropicProvider,
};
use serde::Serialize;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

/// Number of decade pillars listed after the starting age.
const LUCK_PILLAR_COUNT: usize = 8;

#[derive(Parser, Debug)]
#[command(name = "lifekline", version, about = "八字人生K线")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Four pillars, lunar date, luck direction and starting age of a birth
    Pillars {
        #[command(flatten)]
        birth: BirthArgs,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the model prompt for a birth
    Prompt {
        #[command(flatten)]
        birth: BirthArgs,
        #[arg(long, default_value = "30")]
        points: SchemaVersion,
    },
    /// Print the model prompt for hand-entered pillars
    ManualPrompt {
        #[arg(long)]
        birth_year: i32,
        /// Male or Female
        #[arg(long)]
        gender: Gender,
        #[arg(long, required = true, num_args = 4, value_names = ["YEAR", "MONTH", "DAY", "HOUR"])]
        pillars: Vec<String>,
        #[arg(long)]
        first_luck: String,
        #[arg(long)]
        start_age: i64,
        #[arg(long, default_value = "30")]
        points: SchemaVersion,
    },
    /// Validate a result file and print its canonical JSON
    Import {
        file: PathBuf,
        #[arg(long, default_value = "30")]
        points: SchemaVersion,
        /// Print the analysis scores instead of JSON
        #[arg(long)]
        summary: bool,
    },
    /// Ask the model for a chart and validate the answer
    Generate {
        #[command(flatten)]
        birth: BirthArgs,
        #[arg(long, default_value = "30")]
        points: SchemaVersion,
        /// Write the result here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Check provider credentials with a short request
    Ping,
    /// Daily candles around a date, derived from a result file
    Interpolate {
        file: PathBuf,
        #[arg(long)]
        birth: NaiveDate,
        #[arg(long, default_value = "day")]
        view: Granularity,
        /// Defaults to the current date in China Standard Time
        #[arg(long)]
        today: Option<NaiveDate>,
        /// Seed for reproducible jitter
        #[arg(long, conflicts_with = "flat")]
        seed: Option<u64>,
        /// Skip jitter entirely
        #[arg(long)]
        flat: bool,
        #[arg(long, default_value = "30")]
        points: SchemaVersion,
    },
    /// Risk warning, key support/pressure lines and advice groups of a result file
    Annotate {
        file: PathBuf,
        #[arg(long, default_value = "30")]
        points: SchemaVersion,
    },
}

#[derive(Args, Debug)]
pub struct BirthArgs {
    /// Solar birth date, YYYY-MM-DD
    #[arg(long)]
    pub date: NaiveDate,
    /// Double-hour, e.g. 子时
    #[arg(long)]
    pub slot: String,
    /// Male or Female
    #[arg(long)]
    pub gender: String,
}

impl BirthArgs {
    fn request(&self) -> BirthRequest {
        BirthRequest {
            year: self.date.year(),
            month: self.date.month(),
            day: self.date.day(),
            time_slot: self.slot.clone(),
            gender: self.gender.clone(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PillarsReport {
    #[serde(flatten)]
    chart: FourPillarsResult,
    lunar_date: String,
    luck_pillars: Vec<LuckPillar>,
}

fn today_in_china() -> NaiveDate {
    Utc::now().with_timezone(&Shanghai).date_naive()
}

fn load_result(file: &Path, schema: SchemaVersion) -> Result<LifeDestinyResult> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    Ok(import_result(&text, schema)?)
}

fn chart_for(calendar: &AstronomicalCalendar, birth: &BirthArgs) -> Result<FourPillarsResult> {
    Ok(compute_four_pillars_for(calendar, &birth.request())?)
}

pub async fn run(cli: Cli) -> Result<()> {
    let calendar = AstronomicalCalendar::new();

    match cli.command {
        Command::Pillars { birth, json } => {
            let chart = chart_for(&calendar, &birth)?;
            let lunar = calendar.solar_to_lunar(birth.date)?;
            let report = PillarsReport {
                chart,
                lunar_date: lunar.to_string(),
                luck_pillars: chart.luck_pillars(LUCK_PILLAR_COUNT),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_pillars(&report);
            }
        }
        Command::Prompt { birth, points } => {
            let request = birth.request();
            let chart = chart_for(&calendar, &birth)?;
            let gender: Gender = request.gender.parse()?;
            let prompt = build_prompt_for_chart(&chart, gender, request.year, points);
            info!("Prompt hash {}", prompt_hash(&prompt));
            println!("{}", prompt);
        }
        Command::ManualPrompt {
            birth_year,
            gender,
            pillars,
            first_luck,
            start_age,
            points,
        } => {
            let [year_pillar, month_pillar, day_pillar, hour_pillar]: [String; 4] = pillars
                .try_into()
                .map_err(|_| anyhow::anyhow!("--pillars takes exactly four values"))?;
            let manual = ManualPillars {
                year_pillar,
                month_pillar,
                day_pillar,
                hour_pillar,
                first_luck_pillar: first_luck,
                start_age,
            }
            .validate()?;
            let prompt = build_prompt_for_manual(&manual, gender, birth_year, points);
            info!("Prompt hash {}", prompt_hash(&prompt));
            println!("{}", prompt);
        }
        Command::Import {
            file,
            points,
            summary,
        } => {
            let result = load_result(&file, points)?;
            if summary {
                print_summary(&result);
            } else {
                println!("{}", export_result(&result)?);
            }
        }
        Command::Generate { birth, points, out } => {
            let provider = AnthropicProvider::from_env()?;
            let generated =
                generate_destiny(&provider, &calendar, &birth.request(), points).await?;
            if let Some(usage) = generated.usage {
                info!(
                    "Tokens: {} in, {} out",
                    usage.input_tokens, usage.output_tokens
                );
            }
            let text = export_result(&generated.result)?;
            match out {
                Some(path) => {
                    fs::write(&path, text)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!("Saved {} ({})", path.display(), generated.prompt_hash);
                }
                None => println!("{}", text),
            }
        }
        Command::Ping => {
            let provider = AnthropicProvider::from_env()?;
            let reply = provider.check_connection().await?;
            println!("{}", reply);
        }
        Command::Interpolate {
            file,
            birth,
            view,
            today,
            seed,
            flat,
            points,
        } => {
            let result = load_result(&file, points)?;
            let range = view_for(view, today.unwrap_or_else(today_in_china));
            let mut jitter: Box<dyn Jitter> = match (flat, seed) {
                (true, _) => Box::new(NoJitter),
                (false, Some(seed)) => Box::new(RngJitter::seeded(seed)),
                (false, None) => Box::new(RngJitter::thread()),
            };
            let daily = interpolate(&calendar, &range, birth, &result.chart_data, jitter.as_mut());
            info!(
                "{} of {} days covered from {} to {}",
                daily.len(),
                range.len_days(),
                range.start,
                range.end
            );
            println!("{}", serde_json::to_string_pretty(&daily)?);
        }
        Command::Annotate { file, points } => {
            let result = load_result(&file, points)?;
            println!("{}", serde_json::to_string_pretty(&annotations(&result))?);
        }
    }

    Ok(())
}

fn print_pillars(report: &PillarsReport) {
    let [y, m, d, h] = report.chart.pillars.to_strings();
    println!("四柱: {}年 {}月 {}日 {}时", y, m, d, h);
    println!("农历: {}", report.lunar_date);
    println!(
        "起运: {}岁（虚岁） {}",
        report.chart.start_age, report.chart.direction
    );
    let luck: Vec<String> = report
        .luck_pillars
        .iter()
        .map(|p| format!("{}({})", p.gan_zhi, p.start_age))
        .collect();
    println!("大运: {}", luck.join(" "));
}

fn print_summary(result: &LifeDestinyResult) {
    let a = &result.analysis;
    println!("八字: {}", a.bazi.join(" "));
    for (label, score) in [
        ("总评", a.summary_score),
        ("性格", a.personality_score),
        ("事业", a.industry_score),
        ("风水", a.feng_shui_score),
        ("财富", a.wealth_score),
        ("婚姻", a.marriage_score),
        ("健康", a.health_score),
        ("六亲", a.family_score),
        ("币圈", a.crypto_score),
    ] {
        println!("{}: {}", label, format_score(score));
    }
}

fn annotations(result: &LifeDestinyResult) -> serde_json::Value {
    let warning = lowest_energy_below_support(&result.chart_data).map(|p| {
        json!({
            "age": p.age,
            "year": p.year,
            "total": p.energy_score.as_ref().map(|e| e.total),
        })
    });

    let levels = result
        .analysis
        .support_pressure_levels
        .as_deref()
        .unwrap_or_default();
    let keys = price_bounds(&result.chart_data)
        .map(|(low, high)| key_levels(levels, low, high))
        .unwrap_or_default();

    json!({
        "riskWarning": warning,
        "keySupport": keys.support,
        "keyPressure": keys.pressure,
        "adviceGroups": group_advice_by_scenario(&result.chart_data),
    })
}
