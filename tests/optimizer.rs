use async_trait::async_trait;
use post_optimizer::analyze;
use post_optimizer::optimizer::{
    OptimizationRequest, OptimizeError, Optimizer, PostLength, TextGenerator, Tone,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
struct FakeGenerator {
    reply: Result<String, String>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    last_prompt: Arc<Mutex<Option<String>>>,
}

impl FakeGenerator {
    fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            last_prompt: Arc::new(Mutex::new(None)),
        }
    }

    fn failing(message: &str) -> Self {
        let mut fake = Self::replying("");
        fake.reply = Err(message.to_string());
        fake
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.reply.clone()
    }
}

fn request(text: &str) -> OptimizationRequest {
    OptimizationRequest {
        text: text.to_string(),
        tone: Tone::Professional,
        length: PostLength::Medium,
    }
}

#[tokio::test]
async fn empty_input_skips_generation() {
    let fake = FakeGenerator::replying("unused");
    let calls = fake.calls.clone();
    let optimizer = Optimizer::new(fake);

    let result = optimizer.optimize(&request("   ")).await;

    assert!(matches!(result, Err(OptimizeError::EmptyInput)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn parses_labeled_reply() {
    let fake = FakeGenerator::replying(
        "Best posting time: 3:00 PM\nContent score: 77\n- do X\n#growth #career",
    );
    let optimizer = Optimizer::new(fake);

    let content = optimizer
        .optimize(&request("Launch day for the team"))
        .await
        .unwrap();

    assert_eq!(content.best_posting_time, "3:00 PM");
    assert_eq!(content.content_score, 77);
    assert_eq!(content.suggestions, ["do X"]);
    assert_eq!(content.hashtag_suggestions, ["#growth", "#career"]);
}

#[tokio::test]
async fn strips_markdown_from_posting_time() {
    let fake = FakeGenerator::replying("Best Posting Time: **10:00 AM PST**");
    let optimizer = Optimizer::new(fake);

    let content = optimizer.optimize(&request("hello world")).await.unwrap();

    assert_eq!(content.best_posting_time, "10:00 AM PST");
}

#[tokio::test]
async fn falls_back_when_labels_missing() {
    let reply = "The model rambled and gave nothing structured.";
    let fake = FakeGenerator::replying(reply);
    let optimizer = Optimizer::new(fake);

    let content = optimizer.optimize(&request("hello world")).await.unwrap();

    assert_eq!(content.best_posting_time, "9:00 AM EST");
    assert_eq!(content.content_score, 85);
    assert!(content.hashtag_suggestions.is_empty());
    assert!(content.suggestions.is_empty());
    assert_eq!(content.raw_markdown, reply);
}

#[tokio::test]
async fn bullet_lines_become_suggestions() {
    let fake = FakeGenerator::replying(
        "### Tips\n  - Add a hook\n• Close with a question\nNot a bullet line\n-  \n",
    );
    let optimizer = Optimizer::new(fake);

    let content = optimizer.optimize(&request("hello world")).await.unwrap();

    assert_eq!(content.suggestions, ["Add a hook", "Close with a question"]);
}

#[tokio::test]
async fn reach_and_engagement_come_from_the_input() {
    let text = "Shipping our new service today!\nWhat do you think? #rust #backend @team";
    let fake = FakeGenerator::replying("Content score: 90");
    let optimizer = Optimizer::new(fake);

    let content = optimizer.optimize(&request(text)).await.unwrap();
    let baseline = analyze(text);

    assert_eq!(content.estimated_reach, baseline.estimated_reach);
    assert_eq!(content.engagement_score, baseline.engagement_score);
}

#[tokio::test]
async fn external_failure_surfaces_message() {
    let fake = FakeGenerator::failing("endpoint unreachable");
    let calls = fake.calls.clone();
    let optimizer = Optimizer::new(fake);

    let result = optimizer.optimize(&request("hello world")).await;

    match result {
        Err(OptimizeError::ExternalService(message)) => {
            assert!(message.contains("endpoint unreachable"));
        }
        other => panic!("expected ExternalService error, got {:?}", other.map(|_| ())),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn overlapping_calls_never_run_concurrently() {
    let fake = FakeGenerator::replying("Content score: 70").with_delay(Duration::from_millis(50));
    let calls = fake.calls.clone();
    let max_in_flight = fake.max_in_flight.clone();
    let optimizer = Optimizer::new(fake);

    let first_request = request("first post");
    let second_request = request("second post");
    let first = optimizer.optimize(&first_request);
    let second = optimizer.optimize(&second_request);
    let (first, second) = tokio::join!(first, second);

    assert!(first.is_ok());
    assert!(second.is_ok());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn prompt_substitutes_tone_length_and_text() {
    let fake = FakeGenerator::replying("fine");
    let last_prompt = fake.last_prompt.clone();
    let optimizer = Optimizer::new(fake);

    let request = OptimizationRequest {
        text: "A post about shipping".to_string(),
        tone: Tone::Casual,
        length: PostLength::Long,
    };
    optimizer.optimize(&request).await.unwrap();

    let prompt = last_prompt.lock().unwrap().clone().unwrap();
    assert!(prompt.starts_with("As a LinkedIn content expert"));
    assert!(prompt.contains("the tone (casual) and length (long)"));
    assert!(prompt.contains("Original post:\nA post about shipping"));
}
