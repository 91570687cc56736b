//! Film recommendations

use clap::Args;

use crate::domain::Movie;

#[derive(Args, Debug)]
pub struct SimilarArgs {
    /// Resource URI of the target film
    #[arg(long)]
    pub uri: String,

    /// Release date, only the leading year is used
    #[arg(long)]
    pub release_date: Option<String>,

    /// Subject or category label, repeatable
    #[arg(long = "subject")]
    pub subjects: Vec<String>,

    /// Maximum number of results, defaults to the configured limit
    #[arg(long)]
    pub limit: Option<usize>,

    /// Include similarity scores in the output
    #[arg(long)]
    pub scores: bool,
}

impl SimilarArgs {
    fn target(&self) -> Movie {
        let movie = Movie::new(&self.uri).with_subjects(self.subjects.iter().cloned());

        match &self.release_date {
            Some(date) => movie.with_release_date(date.clone()),
            None => movie,
        }
    }
}

pub async fn run(args: SimilarArgs) -> anyhow::Result<()> {
    let config = super::bootstrap();
    let services = crate::create_services(&config).await?;

    let target = args.target();
    let limit = args.limit.unwrap_or(config.similarity.default_limit);

    if args.scores {
        let ranked = services.engine.rank(&target, limit).await?;
        super::print_json(&ranked)
    } else {
        let movies = services.engine.get_similar(&target, limit).await?;
        super::print_json(&movies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_from_args() {
        let args = SimilarArgs {
            uri: "urn:heat".to_string(),
            release_date: Some("1995-12-15".to_string()),
            subjects: vec!["Heist films".to_string()],
            limit: None,
            scores: false,
        };

        let target = args.target();

        assert_eq!(target.uri(), "urn:heat");
        assert_eq!(target.release_year(), Some(1995));
        assert_eq!(target.subjects(), &["Heist films".to_string()]);
    }
}
