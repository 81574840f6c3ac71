//! The virtual clock installed into every captured page before any of its
//! own content runs.
//!
//! All time sources and timer/animation-frame registrations are redirected
//! into one `window.__clock` context object whose `advance(targetMs)`
//! makes frame content a pure function of the target timestamp: pending
//! animation-frame callbacks are flushed first, then due timers run in
//! ascending target order (repeating timers rescheduled at `due + period`),
//! then CSS and Web Animations are pinned to the target time. Every
//! callback is invoked inside its own try/catch so one failing callback
//! cannot abort the frame.

/// Installed via `Page.addScriptToEvaluateOnNewDocument`; a fresh context
/// object per page instance, never shared across jobs.
pub const VIRTUAL_CLOCK_SCRIPT: &str = r#"(() => {
  const clock = {
    now: 0,
    timers: [],
    frameQueue: [],
    nextTimerId: 1,
    nextFrameId: 1,
  };
  window.__clock = clock;

  Date.now = () => clock.now;
  performance.now = () => clock.now;

  window.setTimeout = (callback, delay = 0, ...args) => {
    const id = clock.nextTimerId++;
    clock.timers.push({ id, callback, args, due: clock.now + Number(delay), period: null });
    return id;
  };

  window.setInterval = (callback, delay = 0, ...args) => {
    const id = clock.nextTimerId++;
    clock.timers.push({ id, callback, args, due: clock.now + Number(delay), period: Number(delay) });
    return id;
  };

  window.clearTimeout = window.clearInterval = (id) => {
    clock.timers = clock.timers.filter((t) => t.id !== id);
  };

  window.requestAnimationFrame = (callback) => {
    const id = clock.nextFrameId++;
    clock.frameQueue.push({ id, callback });
    return id;
  };

  window.cancelAnimationFrame = (id) => {
    clock.frameQueue = clock.frameQueue.filter((f) => f.id !== id);
  };

  clock.advance = (target) => {
    clock.now = target;

    const frames = clock.frameQueue.splice(0);
    for (const frame of frames) {
      try {
        frame.callback(clock.now);
      } catch (err) {
        console.error('animation frame callback failed:', err);
      }
    }

    const due = clock.timers.filter((t) => t.due <= target);
    clock.timers = clock.timers.filter((t) => t.due > target);
    for (const timer of due) {
      if (timer.period !== null) {
        clock.timers.push({ ...timer, due: timer.due + timer.period });
      }
    }
    due.sort((a, b) => a.due - b.due);
    for (const timer of due) {
      try {
        timer.callback(...timer.args);
      } catch (err) {
        console.error('timer callback failed:', err);
      }
    }

    for (const el of document.querySelectorAll('*')) {
      const style = getComputedStyle(el);
      if (style.animationName && style.animationName !== 'none') {
        el.style.animationDelay = `-${target}ms`;
        el.style.animationPlayState = 'paused';
      }
    }

    for (const animation of document.getAnimations()) {
      animation.currentTime = target;
    }
  };
})();"#;

/// Expression advancing the page's virtual clock to `target_ms`.
pub fn advance_expression(target_ms: f64) -> String {
    format!("window.__clock.advance({})", target_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_expression_targets_the_clock_context() {
        assert_eq!(advance_expression(0.0), "window.__clock.advance(0)");
        assert_eq!(advance_expression(1900.0), "window.__clock.advance(1900)");
        assert_eq!(
            advance_expression(1000.0 / 30.0),
            format!("window.__clock.advance({})", 1000.0 / 30.0)
        );
    }

    #[test]
    fn script_replaces_every_time_source() {
        for needle in [
            "Date.now",
            "performance.now",
            "window.setTimeout",
            "window.setInterval",
            "window.requestAnimationFrame",
            "window.cancelAnimationFrame",
            "clock.advance",
            "document.getAnimations",
            "animationPlayState",
        ] {
            assert!(
                VIRTUAL_CLOCK_SCRIPT.contains(needle),
                "missing {needle} in injected script"
            );
        }
    }
}
