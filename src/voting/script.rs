use serde::Serialize;

use crate::models::platform::PlatformTemplate;

pub const OPERATION_NAME: &str = "VoteServer";

// User-controlled values only ever enter through variables.
pub const VOTE_MUTATION: &str = r#"mutation VoteServer(
  $url: String!
  $nickname: String!
  $nicknameSelector: String!
  $acceptSelector: String!
  $submitSelector: String!
) {
  reject(type: [image, media]) {
    enabled
  }
  goto(url: $url) {
    status
  }
  waitForForm: waitForSelector(selector: $nicknameSelector, visible: true) { time }
  type(text: $nickname, selector: $nicknameSelector, timeout: 1000.0) { time }
  click(selector: $acceptSelector) { time }
  verify(type: cloudflare) { solved }
  waitForTimeout(time: 1000.0) { time }
  submit: click(selector: $submitSelector) { time }
}"#;

#[derive(Debug, Clone, Copy)]
pub struct VoteTarget<'a> {
    pub server_id: &'a str,
    pub nickname: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteVariables {
    pub url: String,
    pub nickname: String,
    pub nickname_selector: String,
    pub accept_selector: String,
    pub submit_selector: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub query: &'static str,
    pub operation_name: &'static str,
    pub variables: VoteVariables,
}

pub fn build_vote_request(template: &PlatformTemplate, target: VoteTarget<'_>) -> VoteRequest {
    VoteRequest {
        query: VOTE_MUTATION,
        operation_name: OPERATION_NAME,
        variables: VoteVariables {
            url: template.vote_url(target.server_id),
            nickname: target.nickname.to_string(),
            nickname_selector: template.nickname_selector.clone(),
            accept_selector: template.accept_selector.clone(),
            submit_selector: template.submit_selector.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> PlatformTemplate {
        PlatformTemplate {
            url: "https://vote.example/server/{serverId}/vote".to_string(),
            nickname_selector: "#nickname".to_string(),
            accept_selector: "#accept".to_string(),
            submit_selector: "#submit".to_string(),
        }
    }

    #[test]
    fn payload_carries_values_as_variables() {
        let request = build_vote_request(
            &template(),
            VoteTarget {
                server_id: "s1",
                nickname: "alice",
            },
        );
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["operationName"], "VoteServer");
        assert_eq!(body["variables"]["url"], "https://vote.example/server/s1/vote");
        assert_eq!(body["variables"]["nickname"], "alice");
        assert_eq!(body["variables"]["nicknameSelector"], "#nickname");
        assert_eq!(body["variables"]["acceptSelector"], "#accept");
        assert_eq!(body["variables"]["submitSelector"], "#submit");
    }

    #[test]
    fn hostile_nickname_never_reaches_query_text() {
        let nickname = r#"x", selector: "body") { time } evaluate(content: "alert(1)"#;
        let request = build_vote_request(
            &template(),
            VoteTarget {
                server_id: "s1",
                nickname,
            },
        );
        assert!(!request.query.contains("alert"));
        assert_eq!(request.variables.nickname, nickname);

        let body = serde_json::to_string(&request).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed["variables"]["nickname"], nickname);
    }

    #[test]
    fn mutation_keeps_the_vote_steps_in_order() {
        let steps = [
            "reject(type: [image, media])",
            "goto(url: $url)",
            "waitForSelector(selector: $nicknameSelector, visible: true)",
            "type(text: $nickname",
            "click(selector: $acceptSelector)",
            "verify(type: cloudflare)",
            "waitForTimeout(time: 1000.0)",
            "submit: click(selector: $submitSelector)",
        ];
        let mut last = 0;
        for step in steps {
            let pos = VOTE_MUTATION[last..]
                .find(step)
                .unwrap_or_else(|| panic!("missing step {}", step));
            last += pos + step.len();
        }
    }
}
