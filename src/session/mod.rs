use crate::ai::ChatMessage;

/// 会话历史
///
/// system 提示单独存放，永远排在窗口首位，不计入 max_history_length；
/// user/assistant 轮按时间序保留，超限时从最旧的开始淘汰（FIFO）。
///
/// 注意一个刻意保留的行为：`append_user` 先于适配器调用发生，
/// 调用失败时该 user 轮会留在历史里（没有配对的 assistant 轮），
/// 调用方重试会把它作为上下文一并重发，除非先 clear。
#[derive(Clone, Debug)]
pub struct ConversationSession {
    system_prompt: Option<String>,
    turns: Vec<ChatMessage>,
    max_history_length: usize,
}

impl ConversationSession {
    pub fn new(max_history_length: usize) -> Self {
        Self {
            system_prompt: None,
            turns: Vec::new(),
            max_history_length,
        }
    }

    /// 设置（或替换）system 提示
    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.system_prompt = Some(prompt.into());
    }

    pub fn append_user(&mut self, content: impl Into<String>) {
        self.turns.push(ChatMessage::user(content));
    }

    /// 追加 assistant 轮并收紧历史上限
    pub fn append_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(ChatMessage::assistant(content));
        while self.turns.len() > self.max_history_length {
            self.turns.remove(0);
        }
    }

    /// 发给供应商的完整轮次序列：system 在前，随后是保留的历史
    pub fn window(&self) -> Vec<ChatMessage> {
        let mut out = Vec::with_capacity(self.turns.len() + 1);
        if let Some(ref prompt) = self.system_prompt {
            out.push(ChatMessage::system(prompt.clone()));
        }
        out.extend(self.turns.iter().cloned());
        out
    }

    /// 只读快照，顺序与 window 一致
    pub fn history(&self) -> Vec<ChatMessage> {
        self.window()
    }

    /// 清掉所有非 system 轮
    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::Role;

    #[test]
    fn trims_oldest_turns_first() {
        let mut s = ConversationSession::new(4);
        for i in 0..5 {
            s.append_user(format!("q{i}"));
            s.append_assistant(format!("a{i}"));
        }
        let h = s.history();
        // 5 对 = 10 轮，上限 4 → 只留最近 4 轮
        assert_eq!(h.len(), 4);
        assert_eq!(h[0].content, "q3");
        assert_eq!(h[3].content, "a4");
    }

    #[test]
    fn short_history_is_kept_in_full() {
        let mut s = ConversationSession::new(20);
        s.append_user("q0");
        s.append_assistant("a0");
        s.append_user("q1");
        s.append_assistant("a1");
        assert_eq!(s.history().len(), 4);
    }

    #[test]
    fn system_turn_survives_trimming_and_is_not_counted() {
        let mut s = ConversationSession::new(2);
        s.set_system_prompt("be terse");
        for i in 0..3 {
            s.append_user(format!("q{i}"));
            s.append_assistant(format!("a{i}"));
        }
        let h = s.history();
        assert_eq!(h.len(), 3);
        assert_eq!(h[0].role, Role::System);
        assert_eq!(h[1].content, "q2");
        assert_eq!(h[2].content, "a2");
    }

    #[test]
    fn set_system_prompt_replaces_existing() {
        let mut s = ConversationSession::new(10);
        s.set_system_prompt("first");
        s.set_system_prompt("second");
        let h = s.history();
        assert_eq!(h.len(), 1);
        assert_eq!(h[0].content, "second");
    }

    #[test]
    fn clear_keeps_system_prompt() {
        let mut s = ConversationSession::new(10);
        s.set_system_prompt("keep me");
        s.append_user("q");
        s.append_assistant("a");
        s.clear();
        let h = s.history();
        assert_eq!(h.len(), 1);
        assert_eq!(h[0].role, Role::System);
    }

    #[test]
    fn failed_call_leaves_dangling_user_turn() {
        // 模拟 ask 失败路径：只追加了 user 轮
        let mut s = ConversationSession::new(10);
        s.append_user("hi");
        let h = s.history();
        assert_eq!(h.len(), 1);
        assert_eq!(h[0].role, Role::User);
    }
}
