use log::{info, warn};
use sovran_lexicon::Lexicon;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::process::Command;
use toml_edit::{DocumentMut, Item};

type ToolResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Version {
    major: u64,
    minor: u64,
    patch: u64,
}

impl Version {
    fn parse(text: &str) -> ToolResult<Self> {
        let parts: Vec<&str> = text.trim().trim_start_matches('v').split('.').collect();
        if parts.len() != 3 {
            return Err(format!("'{}' is not MAJOR.MINOR.PATCH", text).into());
        }
        Ok(Self {
            major: parts[0].parse()?,
            minor: parts[1].parse()?,
            patch: parts[2].parse()?,
        })
    }

    /// Accepts either an explicit version or one of `major`, `minor`, `patch`.
    fn next(self, answer: &str) -> ToolResult<Self> {
        match answer.trim() {
            "major" => Ok(Self { major: self.major + 1, minor: 0, patch: 0 }),
            "minor" => Ok(Self { minor: self.minor + 1, patch: 0, ..self }),
            "patch" => Ok(Self { patch: self.patch + 1, ..self }),
            explicit => Self::parse(explicit),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

fn run_git(args: &[&str]) -> ToolResult<Option<String>> {
    let output = Command::new("git").args(args).output()?;
    if !output.status.success() {
        return Ok(None);
    }
    Ok(Some(String::from_utf8(output.stdout)?.trim().to_string()))
}

fn latest_tag() -> ToolResult<String> {
    if let Some(tag) = run_git(&["describe", "--tags", "--abbrev=0"])? {
        return Ok(tag);
    }
    // No tags yet: start from the root commit
    Ok(run_git(&["rev-list", "--max-parents=0", "HEAD"])?.unwrap_or_default())
}

fn commit_subjects(previous_tag: &str) -> ToolResult<Vec<String>> {
    let range = format!("{}..HEAD", previous_tag);
    let mut args = vec!["log", "--pretty=format:%s"];
    if !previous_tag.is_empty() {
        args.push(&range);
    }
    Ok(run_git(&args)?
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect())
}

/// Groups commit subjects by their `kind:` prefix.
fn group_commits(subjects: &[String]) -> Lexicon<String, Vec<String>> {
    let mut groups: Lexicon<String, Vec<String>> = Lexicon::new();
    for subject in subjects {
        let (kind, text) = match subject.split_once(':') {
            Some((kind, text)) if !kind.contains(' ') => (kind.to_lowercase(), text.trim()),
            _ => ("other".to_string(), subject.as_str()),
        };
        match groups.get_mut(&kind) {
            Some(lines) => lines.push(text.to_string()),
            None => {
                groups.add(kind, vec![text.to_string()]);
            }
        }
    }
    groups
}

fn release_notes(groups: &Lexicon<String, Vec<String>>) -> String {
    let mut kinds = groups.keys();
    kinds.sort();
    let mut notes = String::new();
    for kind in kinds {
        notes.push_str(&format!("### {}\n", kind));
        for line in groups.fetch(&kind) {
            notes.push_str(&format!("- {}\n", line));
        }
    }
    notes
}

fn confirm(message: &str) -> Result<bool, io::Error> {
    print!("{} (y/n): ", message);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(input.trim().eq_ignore_ascii_case("y"))
}

fn run_steps(version: Version) -> ToolResult<()> {
    let steps = [
        ("git add Cargo.toml Cargo.lock".to_string(), "Failed to stage Cargo.toml"),
        (format!("git commit -m \"Bump version to {}\"", version), "Failed to commit version bump"),
        (format!("git tag -a v{} -m \"Version {}\"", version, version), "Failed to create tag"),
        ("git push".to_string(), "Failed to push commits"),
        ("git push --tags".to_string(), "Failed to push tags"),
    ];

    for (cmd, error_msg) in steps.iter() {
        info!("executing: {}", cmd);
        let status = Command::new("sh").arg("-c").arg(cmd).status()?;
        if !status.success() {
            return Err(error_msg.to_string().into());
        }
    }
    Ok(())
}

fn main() -> ToolResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cargo_content = fs::read_to_string("Cargo.toml")?;
    let mut doc = cargo_content.parse::<DocumentMut>()?;

    let current = doc["package"]["version"]
        .as_str()
        .ok_or("Could not find version in Cargo.toml")
        .and_then(|text| Version::parse(text).map_err(|_| "Cargo.toml version is not MAJOR.MINOR.PATCH"))?;

    println!("Current version is: {}", current);
    println!("Enter new version (or major / minor / patch):");
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    let version = current.next(&answer)?;

    if version <= current {
        return Err(format!("{} does not come after {}", version, current).into());
    }

    if !confirm(&format!("Ready to release version {}?", version))? {
        println!("Release aborted.");
        return Ok(());
    }

    doc["package"]["version"] = Item::from(version.to_string());
    fs::write("Cargo.toml", doc.to_string())?;
    info!("updated Cargo.toml to {}", version);

    // Refresh Cargo.lock for the new version
    let status = Command::new("cargo").arg("check").status()?;
    if !status.success() {
        return Err("Failed to update Cargo.lock".into());
    }

    let previous_tag = latest_tag()?;
    info!(
        "previous tag: {}",
        if previous_tag.is_empty() { "none" } else { previous_tag.as_str() }
    );

    let groups = group_commits(&commit_subjects(&previous_tag)?);
    if groups.is_empty() {
        warn!("no commits found between the previous tag and HEAD");
        if !confirm("Continue with empty release notes?")? {
            println!("Release aborted.");
            return Ok(());
        }
    }
    let notes = release_notes(&groups);
    println!("Release notes:\n{}", notes);

    run_steps(version)?;

    if confirm("Publish to crates.io?")? {
        let status = Command::new("cargo").arg("publish").status()?;
        if !status.success() {
            return Err("Failed to publish to crates.io".into());
        }
    } else {
        info!("skipping crates.io publishing");
    }

    if confirm("Create GitHub release?")? {
        let tag = format!("v{}", version);
        let status = Command::new("gh")
            .args(["release", "create", &tag, "--title", &tag, "--notes", &notes])
            .status()?;
        if !status.success() {
            return Err("Failed to create GitHub release".into());
        }
    } else {
        info!("skipping GitHub release creation");
    }

    println!("Successfully released version {}", version);
    Ok(())
}
