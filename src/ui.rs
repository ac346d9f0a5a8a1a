use crate::models::DailyVisitCounter;

pub fn render_index(counter: &DailyVisitCounter) -> String {
    INDEX_HTML
        .replace("{{DATE}}", &counter.date)
        .replace("{{COUNT}}", &counter.count.to_string())
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Storefront Traffic</title>
  <style>
    :root {
      --paper: #f4f5f7;
      --card: #ffffff;
      --ink: #1f2430;
      --muted: #6c7380;
      --line: #e3e5ea;
      --accent: #3556c9;
    }

    * { box-sizing: border-box; }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--paper);
      color: var(--ink);
      font-family: -apple-system, "Segoe UI", Roboto, Helvetica, Arial, sans-serif;
      padding: 40px 16px;
      display: flex;
      justify-content: center;
    }

    .page {
      width: min(760px, 100%);
      display: grid;
      gap: 20px;
    }

    h1 {
      margin: 0;
      font-size: 1.5rem;
      font-weight: 650;
    }

    .lede {
      margin: 4px 0 0;
      color: var(--muted);
      font-size: 0.95rem;
    }

    .tiles {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(150px, 1fr));
      gap: 12px;
    }

    .tile {
      background: var(--card);
      border: 1px solid var(--line);
      border-radius: 10px;
      padding: 14px 16px;
    }

    .tile .name {
      font-size: 0.78rem;
      text-transform: uppercase;
      letter-spacing: 0.08em;
      color: var(--muted);
    }

    .tile .figure {
      margin-top: 6px;
      font-size: 1.6rem;
      font-weight: 650;
      font-variant-numeric: tabular-nums;
    }

    .board {
      background: var(--card);
      border: 1px solid var(--line);
      border-radius: 10px;
      padding: 18px;
      display: grid;
      gap: 14px;
    }

    .board-head {
      display: flex;
      align-items: baseline;
      justify-content: space-between;
      flex-wrap: wrap;
      gap: 10px;
    }

    .board-head h2 {
      margin: 0;
      font-size: 1.05rem;
    }

    .views button {
      border: 1px solid var(--line);
      background: transparent;
      color: var(--muted);
      border-radius: 6px;
      padding: 6px 12px;
      font-size: 0.85rem;
      cursor: pointer;
    }

    .views button.on {
      border-color: var(--accent);
      color: var(--accent);
      font-weight: 600;
    }

    #chart { width: 100%; height: 220px; display: block; }
    #chart rect { fill: var(--accent); }
    #chart text { fill: var(--muted); font-size: 11px; }
    #chart line { stroke: var(--line); }

    footer {
      color: var(--muted);
      font-size: 0.85rem;
    }
  </style>
</head>
<body>
  <main class="page">
    <header>
      <h1>Storefront Traffic</h1>
      <p class="lede">Daily visitors, counted once per browser per calendar day (UTC).</p>
    </header>

    <section class="tiles">
      <div class="tile">
        <span class="name">Date</span>
        <div class="figure" id="date">{{DATE}}</div>
      </div>
      <div class="tile">
        <span class="name">Visitors today</span>
        <div class="figure" id="today-count">{{COUNT}}</div>
      </div>
      <div class="tile">
        <span class="name">Last 7 days</span>
        <div class="figure" id="week-count">&ndash;</div>
      </div>
      <div class="tile">
        <span class="name">Avg / day this week</span>
        <div class="figure" id="avg-count">&ndash;</div>
      </div>
    </section>

    <section class="board">
      <div class="board-head">
        <h2 id="chart-title">Visitors, last 7 days</h2>
        <div class="views">
          <button type="button" class="on" data-view="daily">Daily</button>
          <button type="button" data-view="weekly">Weekly</button>
          <button type="button" data-view="average">Weekly avg</button>
        </div>
      </div>
      <svg id="chart" viewBox="0 0 640 220" role="img" aria-label="Visitor chart"></svg>
    </section>

    <footer>Counters are keyed by the server's UTC date and persist across restarts.</footer>
  </main>

  <script>
    // Once-per-day visit recording. The marker only advances after the
    // service confirms the visit, so failures retry on the next page load.
    const recordDailyVisit = () => {
      let marker = null;
      try {
        marker = localStorage.getItem('last_visit_date');
      } catch (err) {
        return;
      }
      const today = new Date().toISOString().slice(0, 10);
      if (marker === today) {
        return;
      }
      fetch('/api/visits', { method: 'POST' })
        .then((res) => res.json())
        .then((body) => {
          if (body.success) {
            localStorage.setItem('last_visit_date', today);
          }
        })
        .then(loadAll)
        .catch(() => {});
    };

    const chart = document.getElementById('chart');
    const chartTitle = document.getElementById('chart-title');
    const viewButtons = Array.from(document.querySelectorAll('.views button'));
    let stats = null;
    let view = 'daily';

    const drawBars = (points) => {
      const width = 640;
      const height = 220;
      const left = 36;
      const bottom = 28;
      const top = 12;
      const max = Math.max(1, ...points.map((p) => p.value));
      const band = (width - left) / points.length;
      const scale = (height - top - bottom) / max;

      let marks = `<line x1="${left}" y1="${height - bottom}" x2="${width}" y2="${height - bottom}" />`;
      marks += `<text x="${left - 6}" y="${top + 8}" text-anchor="end">${max}</text>`;
      marks += `<text x="${left - 6}" y="${height - bottom}" text-anchor="end">0</text>`;

      points.forEach((point, i) => {
        const h = point.value * scale;
        const x = left + i * band + band * 0.18;
        marks += `<rect x="${x.toFixed(1)}" y="${(height - bottom - h).toFixed(1)}" width="${(band * 0.64).toFixed(1)}" height="${h.toFixed(1)}" rx="3" />`;
        marks += `<text x="${(left + i * band + band / 2).toFixed(1)}" y="${height - 10}" text-anchor="middle">${point.label}</text>`;
      });

      chart.innerHTML = marks;
    };

    const render = () => {
      if (!stats) return;
      if (view === 'weekly') {
        chartTitle.textContent = 'Visitors per week';
        drawBars(stats.weekly_totals.map((w) => ({ label: w.week.slice(5), value: w.count })));
      } else if (view === 'average') {
        chartTitle.textContent = 'Average visitors per day, by week';
        drawBars(stats.weekly_averages.map((w) => ({
          label: w.week.slice(5),
          value: Math.round(w.avg_count * 10) / 10
        })));
      } else {
        chartTitle.textContent = 'Visitors, last 7 days';
        drawBars(stats.last_7_days.map((d) => ({ label: d.date.slice(5), value: d.count })));
      }
    };

    const loadToday = async () => {
      const res = await fetch('/api/today');
      if (!res.ok) return;
      const body = await res.json();
      document.getElementById('date').textContent = body.date;
      document.getElementById('today-count').textContent = body.count;
    };

    const loadStats = async () => {
      const res = await fetch('/api/stats');
      if (!res.ok) return;
      stats = await res.json();
      const weekTotal = stats.last_7_days.reduce((sum, d) => sum + d.count, 0);
      document.getElementById('week-count').textContent = weekTotal;
      const current = stats.weekly_averages[stats.weekly_averages.length - 1];
      document.getElementById('avg-count').textContent =
        (Math.round(current.avg_count * 10) / 10).toString();
      render();
    };

    const loadAll = () => Promise.all([loadToday(), loadStats()]).catch(() => {});

    viewButtons.forEach((button) => {
      button.addEventListener('click', () => {
        view = button.dataset.view;
        viewButtons.forEach((b) => b.classList.toggle('on', b === button));
        render();
      });
    });

    recordDailyVisit();
    loadAll();
  </script>
</body>
</html>
"#;
